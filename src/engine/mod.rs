use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::{radius_for_score, PLAYER_COLOR};
use crate::error::ReportRejection;
use crate::rng::Rng;
use crate::strategy::MovementStrategy;
use crate::types::{
    Food, FoodEatenEntry, GameConfig, InitPayload, OutboundEvent, Snapshot, Vec2, Worm, WormKind,
};

mod collision;
mod economy;
mod movement;
mod spawn_system;
mod utils;

pub use self::movement::{advance_head, chain_segments, turn_toward};

use self::utils::{
    death_drop_indices, nearest_body_distance, pick_bot_color, random_heading,
    random_point_inside, trailing_segments,
};

/// `Dead` lasts until the next tick's lifecycle pass removes or respawns the worm.
#[derive(Clone, Debug, PartialEq)]
enum LifeState {
    Alive,
    Dead { killer_id: String, at_tick: u64 },
}

#[derive(Clone, Debug)]
struct WormInternal {
    view: Worm,
    life: LifeState,
}

impl WormInternal {
    fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    rng: Rng,
    seed: u32,
    worms: BTreeMap<String, WormInternal>,
    foods: BTreeMap<String, Food>,
    target_directions: HashMap<String, Vec2>,
    strategies: HashMap<String, MovementStrategy>,
    connected_players: HashSet<String>,
    events: Vec<OutboundEvent>,
    eaten_this_tick: Vec<FoodEatenEntry>,

    tick_counter: u64,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let mut engine = Self {
            config,
            rng: Rng::new(seed),
            seed,
            worms: BTreeMap::new(),
            foods: BTreeMap::new(),
            target_directions: HashMap::new(),
            strategies: HashMap::new(),
            connected_players: HashSet::new(),
            events: Vec::new(),
            eaten_this_tick: Vec::new(),
            tick_counter: 0,
            next_id_counter: 1,
        };
        engine.top_up_food();
        engine
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn worm(&self, id: &str) -> Option<&Worm> {
        self.worms.get(id).map(|entry| &entry.view)
    }

    pub fn worms(&self) -> impl Iterator<Item = &Worm> {
        self.worms.values().map(|entry| &entry.view)
    }

    pub fn food(&self, id: &str) -> Option<&Food> {
        self.foods.get(id)
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }

    pub fn target_direction(&self, id: &str) -> Option<Vec2> {
        self.target_directions.get(id).copied()
    }

    pub fn strategy(&self, id: &str) -> Option<&MovementStrategy> {
        self.strategies.get(id)
    }

    pub fn is_alive(&self, id: &str) -> bool {
        self.worms.get(id).map(WormInternal::is_alive).unwrap_or(false)
    }

    pub fn player_count(&self) -> usize {
        self.connected_players.len()
    }

    pub fn bot_count(&self) -> usize {
        self.worms.values().filter(|entry| entry.view.is_bot()).count()
    }

    pub fn step(&mut self, dt: Duration) {
        self.tick_counter += 1;
        let dt_sec = dt.as_secs_f32();

        self.balance_bot_population();
        self.top_up_food();
        self.resolve_deaths();
        self.drain_sprint(dt_sec * 1000.0);
        self.update_bot_directions();
        self.advance_worms(dt_sec);
        self.resolve_bot_food();
        self.sweep_worm_collisions();
    }

    pub fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            worms: self.worms().cloned().collect(),
            foods: self.foods.values().cloned().collect(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<OutboundEvent> {
        if !self.eaten_this_tick.is_empty() {
            let entries = std::mem::take(&mut self.eaten_this_tick);
            self.events.push(OutboundEvent::FoodEaten { entries });
        }
        std::mem::take(&mut self.events)
    }

    pub fn join(&mut self, session_id: &str, nickname: &str) -> Option<InitPayload> {
        if self.worms.contains_key(session_id) {
            debug!(session_id, "join ignored, worm already present");
            return None;
        }

        let worm = self.create_player_worm(session_id, nickname);
        if let Some(direction) = worm.direction.normalized() {
            self.target_directions.insert(session_id.to_string(), direction);
        }
        self.connected_players.insert(session_id.to_string());
        self.worms.insert(
            session_id.to_string(),
            WormInternal {
                view: worm.clone(),
                life: LifeState::Alive,
            },
        );
        info!(
            session_id,
            nickname = %worm.nickname,
            players = self.connected_players.len(),
            "player joined"
        );
        self.events.push(OutboundEvent::WormJoined { worm });

        Some(InitPayload {
            self_id: session_id.to_string(),
            worms: self.worms().cloned().collect(),
            foods: self.foods.values().cloned().collect(),
            config: self.config.clone(),
        })
    }

    pub fn disconnect(&mut self, session_id: &str) {
        let was_connected = self.connected_players.remove(session_id);
        let removed = self.remove_worm(session_id);
        if was_connected || removed.is_some() {
            info!(
                session_id,
                players = self.connected_players.len(),
                "player disconnected"
            );
        }
    }

    pub fn set_target_direction(&mut self, worm_id: &str, x: f32, y: f32) {
        if !self.is_alive(worm_id) {
            return;
        }
        let Some(direction) = Vec2::new(x, y).normalized() else {
            return;
        };
        self.target_directions.insert(worm_id.to_string(), direction);
    }

    pub fn set_sprinting(&mut self, worm_id: &str, sprinting: bool) {
        let Some(entry) = self.worms.get_mut(worm_id) else {
            return;
        };
        if entry.is_alive() {
            entry.view.is_sprinting = sprinting;
        }
    }

    pub fn report_food_eaten(
        &mut self,
        worm_id: &str,
        food_id: &str,
    ) -> Result<(), ReportRejection> {
        self.validate_food_report(worm_id, food_id)?;
        self.feed_worm(worm_id, food_id);
        Ok(())
    }

    pub fn report_collision(
        &mut self,
        reporter_id: &str,
        collider_id: &str,
    ) -> Result<(), ReportRejection> {
        self.validate_collision_report(reporter_id, collider_id)?;
        self.kill_worm(collider_id, reporter_id);
        Ok(())
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::constants::TICK_MS;
    use crate::engine::{GameEngine, LifeState, WormInternal};
    use crate::error::ReportRejection;
    use crate::strategy::MovementStrategy;
    use crate::types::{
        BotArchetype, Food, GameConfig, OutboundEvent, Vec2, Worm, WormKind,
    };

    const TICK: Duration = Duration::from_millis(TICK_MS);

    fn quiet_config() -> GameConfig {
        GameConfig {
            minimum_food_count: 0,
            bot_count: 0,
            ..GameConfig::default()
        }
    }

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    fn straight_segments(head: Vec2, count: usize, spacing: f32) -> Vec<Vec2> {
        (0..count)
            .map(|idx| Vec2::new(head.x - idx as f32 * spacing, head.y))
            .collect()
    }

    fn place_worm(engine: &mut GameEngine, id: &str, kind: WormKind, head: Vec2, score: u32) {
        let radius = engine.config.segment_default_radius
            + score as f32 * engine.config.segment_growth_radius;
        let worm = Worm {
            id: id.to_string(),
            nickname: id.to_string(),
            score,
            kind,
            bot_type: (kind == WormKind::Bot).then_some(BotArchetype::FoodSeeker),
            segments: straight_segments(
                head,
                engine.config.segment_default_count,
                engine.config.segment_spacing,
            ),
            direction: Vec2::new(1.0, 0.0),
            is_sprinting: false,
            color: 0x00ff00,
            radius,
            is_dead: false,
            sprint_food_drop_timer: 0.0,
        };
        engine.worms.insert(
            id.to_string(),
            WormInternal {
                view: worm,
                life: LifeState::Alive,
            },
        );
        if kind == WormKind::Bot {
            let strategy =
                MovementStrategy::for_archetype(BotArchetype::FoodSeeker, &engine.config);
            engine.strategies.insert(id.to_string(), strategy);
        } else {
            engine.connected_players.insert(id.to_string());
        }
    }

    fn place_food(engine: &mut GameEngine, id: &str, at: Vec2) {
        engine.foods.insert(
            id.to_string(),
            Food {
                id: id.to_string(),
                x: at.x,
                y: at.y,
                radius: engine.config.food_radius,
                color: engine.config.food_color,
            },
        );
    }

    fn died_events(events: &[OutboundEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::WormDied {
                    killed_id,
                    killer_id,
                } => Some((killed_id.clone(), killer_id.clone())),
                _ => None,
            })
            .collect()
    }

    fn assert_invariants(engine: &GameEngine) {
        let config = &engine.config;
        for worm in engine.worms() {
            assert!(!worm.segments.is_empty(), "{} lost its head", worm.id);
            let expected =
                config.segment_default_radius + worm.score as f32 * config.segment_growth_radius;
            assert!(
                approx_eq(worm.radius, expected, 1e-3),
                "{} radius {} != {}",
                worm.id,
                worm.radius,
                expected
            );
        }
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let config = GameConfig {
            minimum_food_count: 40,
            ..GameConfig::default()
        };
        let mut a = GameEngine::new(config.clone(), 424_242);
        let mut b = GameEngine::new(config, 424_242);
        a.join("p1", "Alice");
        b.join("p1", "Alice");

        for _ in 0..200 {
            a.step(TICK);
            b.step(TICK);
            let sa = a.build_snapshot();
            let sb = b.build_snapshot();
            assert_eq!(sa.worms.len(), sb.worms.len());
            assert_eq!(sa.foods.len(), sb.foods.len());
            for (wa, wb) in sa.worms.iter().zip(sb.worms.iter()) {
                assert_eq!(wa.id, wb.id);
                assert_eq!(wa.head().x.to_bits(), wb.head().x.to_bits());
                assert_eq!(wa.head().y.to_bits(), wb.head().y.to_bits());
                assert_eq!(wa.score, wb.score);
            }
        }
    }

    #[test]
    fn invariants_hold_over_a_busy_match() {
        let config = GameConfig {
            minimum_food_count: 150,
            map_width: 2_000.0,
            map_height: 2_000.0,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 31_337);
        engine.join("p1", "Alice");
        engine.set_sprinting("p1", true);

        for tick in 0..600 {
            if tick % 45 == 0 {
                engine.set_target_direction("p1", (tick as f32).cos(), (tick as f32).sin());
            }
            engine.step(TICK);
            assert_invariants(&engine);
            for worm in engine.worms() {
                for pair in worm.segments.windows(2) {
                    assert!(
                        pair[0].distance(pair[1]) <= engine.config.segment_spacing + 1e-2,
                        "chain stretched on {}",
                        worm.id
                    );
                }
            }
            engine.drain_events();
        }
    }

    #[test]
    fn feeding_grows_score_radius_and_tail() {
        let mut engine = GameEngine::new(quiet_config(), 1);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(500.0, 500.0), 10);
        let head = engine.worm("p1").expect("worm placed").head();
        let tail_before = engine.worm("p1").expect("worm placed").tail();
        let len_before = engine.worm("p1").expect("worm placed").segments.len();
        place_food(&mut engine, "food_a", head);

        assert_eq!(engine.report_food_eaten("p1", "food_a"), Ok(()));

        let worm = engine.worm("p1").expect("worm still present");
        assert_eq!(worm.score, 11);
        assert!(approx_eq(worm.radius, 56.5, 1e-6));
        assert_eq!(worm.segments.len(), len_before + 1);
        assert_eq!(worm.tail(), tail_before);
        assert!(engine.food("food_a").is_none());

        let events = engine.drain_events();
        let entries: Vec<(String, String)> = events
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::FoodEaten { entries } => Some(entries),
                _ => None,
            })
            .flatten()
            .map(|entry| (entry.worm_id.clone(), entry.food_id.clone()))
            .collect();
        assert_eq!(entries, vec![("p1".to_string(), "food_a".to_string())]);
    }

    #[test]
    fn distant_food_report_is_rejected() {
        let mut engine = GameEngine::new(quiet_config(), 2);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        place_food(&mut engine, "food_far", Vec2::new(1_500.0, 1_000.0));

        let result = engine.report_food_eaten("p1", "food_far");
        assert!(matches!(result, Err(ReportRejection::OutOfRange { .. })));
        assert!(engine.food("food_far").is_some());
        assert_eq!(engine.worm("p1").map(|worm| worm.score), Some(0));
    }

    #[test]
    fn rejected_food_report_is_idempotent() {
        let mut engine = GameEngine::new(quiet_config(), 3);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 4);
        place_food(&mut engine, "food_far", Vec2::new(1_500.0, 1_000.0));
        engine.drain_events();
        let before = engine.build_snapshot();

        for _ in 0..2 {
            assert!(engine.report_food_eaten("p1", "food_far").is_err());
            assert!(engine.report_food_eaten("p1", "food_missing").is_err());
            assert!(engine.drain_events().is_empty());
        }

        let after = engine.build_snapshot();
        assert_eq!(before.worms, after.worms);
        assert_eq!(before.foods, after.foods);
    }

    #[test]
    fn food_report_within_tolerance_is_accepted() {
        let mut engine = GameEngine::new(quiet_config(), 4);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        let reach = engine.config.segment_default_radius
            + engine.config.food_radius
            + engine.config.collision_tolerance;
        place_food(&mut engine, "food_edge", Vec2::new(1_000.0 + reach - 0.5, 1_000.0));

        assert_eq!(engine.report_food_eaten("p1", "food_edge"), Ok(()));
    }

    #[test]
    fn food_report_from_dead_or_unknown_worm_is_rejected() {
        let mut engine = GameEngine::new(quiet_config(), 5);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        place_food(&mut engine, "food_a", Vec2::new(1_000.0, 1_000.0));

        assert_eq!(
            engine.report_food_eaten("ghost", "food_a"),
            Err(ReportRejection::UnknownWorm("ghost".to_string()))
        );
        engine.kill_worm("p1", "someone");
        assert_eq!(
            engine.report_food_eaten("p1", "food_a"),
            Err(ReportRejection::DeadWorm("p1".to_string()))
        );
    }

    #[test]
    fn bots_eat_food_on_the_server() {
        let mut engine = GameEngine::new(quiet_config(), 6);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(800.0, 800.0), 0);
        place_food(&mut engine, "food_a", Vec2::new(830.0, 800.0));
        place_food(&mut engine, "food_b", Vec2::new(3_000.0, 3_000.0));

        engine.resolve_bot_food();

        assert!(engine.food("food_a").is_none());
        assert!(engine.food("food_b").is_some());
        assert_eq!(engine.worm("bot_1").map(|worm| worm.score), Some(1));
    }

    #[test]
    fn pellet_is_eaten_once_when_two_bots_reach_it() {
        let mut engine = GameEngine::new(quiet_config(), 7);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(800.0, 800.0), 0);
        place_worm(&mut engine, "bot_2", WormKind::Bot, Vec2::new(820.0, 4_000.0), 0);
        engine
            .worms
            .get_mut("bot_2")
            .expect("bot placed")
            .view
            .segments[0] = Vec2::new(820.0, 800.0);
        place_food(&mut engine, "food_a", Vec2::new(810.0, 800.0));

        engine.resolve_bot_food();

        let total: u32 = engine.worms().map(|worm| worm.score).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn bot_dies_exactly_once_when_touching_two_bodies() {
        let mut engine = GameEngine::new(quiet_config(), 8);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        place_worm(&mut engine, "p2", WormKind::Player, Vec2::new(1_000.0, 1_030.0), 0);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(3_000.0, 3_000.0), 0);
        engine
            .worms
            .get_mut("bot_1")
            .expect("bot placed")
            .view
            .segments[0] = Vec2::new(980.0, 1_015.0);

        engine.sweep_worm_collisions();

        assert!(!engine.is_alive("bot_1"));
        assert!(engine.is_alive("p1"));
        assert!(engine.is_alive("p2"));
        let died = died_events(&engine.drain_events());
        assert_eq!(died.len(), 1);
        assert_eq!(died[0].0, "bot_1");
    }

    #[test]
    fn player_heads_are_not_swept_by_default() {
        let mut engine = GameEngine::new(quiet_config(), 9);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(1_000.0, 1_000.0), 0);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(3_000.0, 3_000.0), 0);
        engine
            .worms
            .get_mut("p1")
            .expect("player placed")
            .view
            .segments[0] = Vec2::new(972.0, 1_000.0);

        engine.sweep_worm_collisions();
        assert!(engine.is_alive("p1"));

        engine.config.server_authoritative_players = true;
        engine.sweep_worm_collisions();
        assert!(!engine.is_alive("p1"));
    }

    #[test]
    fn collision_report_kills_validated_collider() {
        let mut engine = GameEngine::new(quiet_config(), 10);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        place_worm(&mut engine, "p2", WormKind::Player, Vec2::new(3_000.0, 3_000.0), 6);
        engine
            .worms
            .get_mut("p2")
            .expect("player placed")
            .view
            .segments[0] = Vec2::new(958.0, 1_050.0);

        assert_eq!(engine.report_collision("p1", "p2"), Ok(()));
        assert!(!engine.is_alive("p2"));
        let died = died_events(&engine.drain_events());
        assert_eq!(died, vec![("p2".to_string(), "p1".to_string())]);

        assert_eq!(
            engine.report_collision("p1", "p2"),
            Err(ReportRejection::DeadWorm("p2".to_string()))
        );
        assert!(died_events(&engine.drain_events()).is_empty());
    }

    #[test]
    fn collision_report_out_of_range_is_rejected() {
        let mut engine = GameEngine::new(quiet_config(), 11);
        place_worm(&mut engine, "p1", WormKind::Player, Vec2::new(1_000.0, 1_000.0), 0);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(2_000.0, 1_000.0), 0);

        assert!(matches!(
            engine.report_collision("p1", "bot_1"),
            Err(ReportRejection::OutOfRange { .. })
        ));
        assert_eq!(
            engine.report_collision("p1", "p1"),
            Err(ReportRejection::SelfCollision("p1".to_string()))
        );
        assert!(engine.is_alive("bot_1"));
    }

    #[test]
    fn death_scatters_half_score_along_body() {
        let mut config = quiet_config();
        config.segment_default_count = 15;
        let mut engine = GameEngine::new(config, 12);
        place_worm(&mut engine, "bot_1", WormKind::Bot, Vec2::new(1_000.0, 1_000.0), 10);
        let segments = engine.worm("bot_1").expect("bot placed").segments.clone();

        engine.kill_worm("bot_1", "p1");

        let mut drops: Vec<Vec2> = engine.foods().map(|food| food.position()).collect();
        drops.sort_by(|a, b| b.x.total_cmp(&a.x));
        let expected: Vec<Vec2> = [0, 3, 6, 9, 12].iter().map(|&idx| segments[idx]).collect();
        assert_eq!(drops, expected);
    }

    #[test]
    fn killed_worm_stays_until_next_tick() {
        let mut engine = GameEngine::new(quiet_config(), 13);
        engine.join("p1", "Alice");
        engine.drain_events();
        engine.kill_worm("p1", "bot_9");

        let worm = engine.worm("p1").expect("dead worm remains this tick");
        assert!(worm.is_dead);
        assert!(matches!(
            engine.worms.get("p1").map(|entry| &entry.life),
            Some(LifeState::Dead { killer_id, .. }) if killer_id == "bot_9"
        ));

        engine.step(TICK);
        assert!(engine.worm("p1").is_none());
        assert_eq!(engine.player_count(), 1);
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|event| matches!(event, OutboundEvent::WormLeft { id } if id == "p1")));

        assert!(engine.join("p1", "Alice").is_some());
    }

    #[test]
    fn dead_bot_respawns_with_same_id_and_color() {
        let config = GameConfig {
            bot_count: 1,
            minimum_food_count: 0,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 14);
        engine.join("p1", "Alice");
        engine.step(TICK);
        let bot = engine
            .worms()
            .find(|worm| worm.is_bot())
            .cloned()
            .expect("bot spawned for the player");
        engine
            .worms
            .get_mut(&bot.id)
            .expect("bot present")
            .view
            .score = 8;
        engine.kill_worm(&bot.id, "p1");

        engine.step(TICK);

        let respawned = engine.worm(&bot.id).expect("bot respawned under same id");
        assert!(!respawned.is_dead);
        assert_eq!(respawned.color, bot.color);
        assert_eq!(respawned.score, 0);
        assert_eq!(respawned.segments.len(), engine.config.segment_default_count);
        assert_eq!(
            engine.strategy(&bot.id).map(MovementStrategy::archetype),
            respawned.bot_type
        );
    }

    #[test]
    fn bot_population_follows_player_count() {
        let config = GameConfig {
            bot_count: 6,
            minimum_food_count: 10,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 15);
        engine.step(TICK);
        assert_eq!(engine.bot_count(), 0);

        engine.join("p1", "Alice");
        engine.step(TICK);
        assert_eq!(engine.bot_count(), 6);

        engine.disconnect("p1");
        engine.step(TICK);
        assert_eq!(engine.bot_count(), 0);
        assert!(engine.strategies.is_empty());
    }

    #[test]
    fn disconnect_removes_worm_from_every_map() {
        let mut engine = GameEngine::new(quiet_config(), 16);
        engine.join("p1", "Alice");
        assert!(engine.target_direction("p1").is_some());

        engine.disconnect("p1");
        assert!(engine.worm("p1").is_none());
        assert!(engine.target_direction("p1").is_none());
        assert_eq!(engine.player_count(), 0);

        engine.set_target_direction("p1", 1.0, 0.0);
        engine.set_sprinting("p1", true);
        assert!(engine.target_direction("p1").is_none());
        assert!(matches!(
            engine.report_food_eaten("p1", "food_1"),
            Err(ReportRejection::UnknownWorm(_))
        ));
    }

    #[test]
    fn zero_length_target_is_ignored() {
        let mut engine = GameEngine::new(quiet_config(), 17);
        engine.join("p1", "Alice");
        let before = engine.target_direction("p1");
        engine.set_target_direction("p1", 0.0, 0.0);
        assert_eq!(engine.target_direction("p1"), before);

        engine.set_target_direction("p1", 0.0, -5.0);
        assert_eq!(engine.target_direction("p1"), Some(Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn duplicate_join_is_ignored() {
        let mut engine = GameEngine::new(quiet_config(), 18);
        let init = engine.join("p1", "Alice").expect("first join creates a worm");
        assert_eq!(init.self_id, "p1");
        assert!(init.worms.iter().any(|worm| worm.id == "p1"));
        assert!(engine.join("p1", "Alice again").is_none());
        assert_eq!(engine.player_count(), 1);
    }

    #[test]
    fn food_is_topped_up_inside_the_inset() {
        let config = GameConfig {
            minimum_food_count: 120,
            map_width: 1_000.0,
            map_height: 800.0,
            ..GameConfig::default()
        };
        let engine = GameEngine::new(config, 19);
        assert_eq!(engine.foods().count(), 120);
        let inset = engine.config.food_spawn_inset;
        for food in engine.foods() {
            assert!(food.x >= inset && food.x <= 1_000.0 - inset);
            assert!(food.y >= inset && food.y <= 800.0 - inset);
        }
    }
}
