use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOT_COUNT, FOOD_COLOR, FOOD_RADIUS, FOOD_SEEKER_WANDER_CHANCE, FOOD_SPAWN_INSET,
    HEAD_SPEED, HEAD_SPRINT_SPEED, MAP_HEIGHT, MAP_WIDTH, MAX_COLLISION_TOLERANCE,
    MINIMUM_FOOD_COUNT, SEGMENT_DEFAULT_COUNT, SEGMENT_DEFAULT_RADIUS, SEGMENT_GROWTH_RADIUS,
    SEGMENT_SPACING, SPAWN_INSET, SPRINT_FOOD_DROP_INTERVAL_MS, TICK_RATE, TURN_RATE,
};
use crate::error::{ConfigError, EngineError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WormKind {
    Player,
    Bot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotArchetype {
    FoodSeeker,
    PlayerTracker,
}

impl BotArchetype {
    pub const ALL: [BotArchetype; 2] = [BotArchetype::FoodSeeker, BotArchetype::PlayerTracker];

    pub fn from_code(code: u8) -> Result<Self, EngineError> {
        match code {
            0 => Ok(Self::FoodSeeker),
            1 => Ok(Self::PlayerTracker),
            other => Err(EngineError::UnknownArchetype(other.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FoodSeeker => "FoodSeeker",
            Self::PlayerTracker => "PlayerTracker",
        }
    }
}

impl FromStr for BotArchetype {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim().to_ascii_lowercase();
        if let Ok(code) = name.parse::<u8>() {
            return Self::from_code(code);
        }
        match name.as_str() {
            "food_seeker" | "foodseeker" => Ok(Self::FoodSeeker),
            "player_tracker" | "playertracker" => Ok(Self::PlayerTracker),
            _ => Err(EngineError::UnknownArchetype(value.to_string())),
        }
    }
}

impl fmt::Display for BotArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Worm {
    pub id: String,
    pub nickname: String,
    pub score: u32,
    #[serde(rename = "type")]
    pub kind: WormKind,
    #[serde(rename = "botType", skip_serializing_if = "Option::is_none")]
    pub bot_type: Option<BotArchetype>,
    pub segments: Vec<Vec2>,
    pub direction: Vec2,
    #[serde(rename = "isSprinting")]
    pub is_sprinting: bool,
    pub color: u32,
    pub radius: f32,
    #[serde(rename = "isDead")]
    pub is_dead: bool,
    #[serde(rename = "sprintFoodDropTimer")]
    pub sprint_food_drop_timer: f32,
}

impl Worm {
    pub fn head(&self) -> Vec2 {
        self.segments.first().copied().unwrap_or_default()
    }

    pub fn tail(&self) -> Vec2 {
        self.segments.last().copied().unwrap_or_default()
    }

    pub fn body(&self) -> &[Vec2] {
        self.segments.get(1..).unwrap_or(&[])
    }

    pub fn is_bot(&self) -> bool {
        self.kind == WormKind::Bot
    }

    pub fn is_player(&self) -> bool {
        self.kind == WormKind::Player
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Food {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: u32,
}

impl Food {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FoodEatenEntry {
    #[serde(rename = "wormId")]
    pub worm_id: String,
    #[serde(rename = "foodId")]
    pub food_id: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundEvent {
    WormJoined {
        worm: Worm,
    },
    WormLeft {
        id: String,
    },
    FoodEaten {
        entries: Vec<FoodEatenEntry>,
    },
    WormDied {
        #[serde(rename = "killedId")]
        killed_id: String,
        #[serde(rename = "killerId")]
        killer_id: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub worms: Vec<Worm>,
    pub foods: Vec<Food>,
}

#[derive(Clone, Debug, Serialize)]
pub struct InitPayload {
    #[serde(rename = "selfId")]
    pub self_id: String,
    pub worms: Vec<Worm>,
    pub foods: Vec<Food>,
    pub config: GameConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub tick_rate: u32,
    pub map_width: f32,
    pub map_height: f32,
    pub spawn_inset: f32,
    pub food_spawn_inset: f32,
    pub head_speed: f32,
    pub head_sprint_speed: f32,
    pub turn_rate: f32,
    pub segment_spacing: f32,
    pub segment_default_count: usize,
    pub segment_default_radius: f32,
    pub segment_growth_radius: f32,
    pub minimum_food_count: usize,
    pub food_radius: f32,
    pub food_color: u32,
    pub sprint_food_drop_interval_ms: f32,
    pub collision_tolerance: f32,
    pub bot_count: usize,
    pub bot_archetypes: Vec<BotArchetype>,
    pub food_seeker_wander_chance: f32,
    pub server_authoritative_players: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,
            spawn_inset: SPAWN_INSET,
            food_spawn_inset: FOOD_SPAWN_INSET,
            head_speed: HEAD_SPEED,
            head_sprint_speed: HEAD_SPRINT_SPEED,
            turn_rate: TURN_RATE,
            segment_spacing: SEGMENT_SPACING,
            segment_default_count: SEGMENT_DEFAULT_COUNT,
            segment_default_radius: SEGMENT_DEFAULT_RADIUS,
            segment_growth_radius: SEGMENT_GROWTH_RADIUS,
            minimum_food_count: MINIMUM_FOOD_COUNT,
            food_radius: FOOD_RADIUS,
            food_color: FOOD_COLOR,
            sprint_food_drop_interval_ms: SPRINT_FOOD_DROP_INTERVAL_MS,
            collision_tolerance: MAX_COLLISION_TOLERANCE,
            bot_count: BOT_COUNT,
            bot_archetypes: BotArchetype::ALL.to_vec(),
            food_seeker_wander_chance: FOOD_SEEKER_WANDER_CHANCE,
            server_authoritative_players: false,
        }
    }
}

impl GameConfig {
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.tick_rate.max(1) as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::Invalid {
                field: "tick_rate",
                reason: format!("must be within 1..=1000, got {}", self.tick_rate),
            });
        }
        for (field, inset) in [
            ("spawn_inset", self.spawn_inset),
            ("food_spawn_inset", self.food_spawn_inset),
        ] {
            if inset < 0.0 || self.map_width <= inset * 2.0 || self.map_height <= inset * 2.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!(
                        "arena {}x{} leaves no room inside inset {inset}",
                        self.map_width, self.map_height
                    ),
                });
            }
        }
        if self.segment_default_count == 0 {
            return Err(ConfigError::Invalid {
                field: "segment_default_count",
                reason: "a worm needs at least its head".to_string(),
            });
        }
        if self.segment_spacing <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "segment_spacing",
                reason: format!("must be positive, got {}", self.segment_spacing),
            });
        }
        if self.sprint_food_drop_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "sprint_food_drop_interval_ms",
                reason: format!("must be positive, got {}", self.sprint_food_drop_interval_ms),
            });
        }
        if self.bot_count > 0 && self.bot_archetypes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "bot_archetypes",
                reason: "bots requested but no archetype enabled".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.food_seeker_wander_chance) {
            return Err(ConfigError::Invalid {
                field: "food_seeker_wander_chance",
                reason: format!("must be a probability, got {}", self.food_seeker_wander_chance),
            });
        }
        Ok(())
    }
}
