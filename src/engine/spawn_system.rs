use super::*;
use crate::types::BotArchetype;

impl GameEngine {
    pub(super) fn balance_bot_population(&mut self) {
        let bot_ids: Vec<String> = self
            .worms
            .values()
            .filter(|entry| entry.view.is_bot())
            .map(|entry| entry.view.id.clone())
            .collect();

        if self.connected_players.is_empty() {
            if bot_ids.is_empty() {
                return;
            }
            for id in &bot_ids {
                self.remove_worm(id);
            }
            info!(removed = bot_ids.len(), "no players left, bots removed");
            return;
        }

        if bot_ids.is_empty() && self.config.bot_count > 0 {
            let mut spawned = 0;
            for _ in 0..self.config.bot_count {
                if self.spawn_bot().is_some() {
                    spawned += 1;
                }
            }
            info!(spawned, players = self.connected_players.len(), "bots spawned");
        }
    }

    pub(super) fn resolve_deaths(&mut self) {
        let dead: Vec<(String, bool)> = self
            .worms
            .values()
            .filter(|entry| !entry.is_alive())
            .map(|entry| (entry.view.id.clone(), entry.view.is_bot()))
            .collect();

        for (id, is_bot) in dead {
            if is_bot {
                self.respawn_bot(&id);
            } else {
                self.remove_worm(&id);
                debug!(worm_id = %id, "dead player removed");
            }
        }
    }

    pub(super) fn spawn_bot(&mut self) -> Option<String> {
        let id = self.make_id("bot");
        let color = pick_bot_color(&mut self.rng);
        self.insert_bot(&id, color)?;
        Some(id)
    }

    fn respawn_bot(&mut self, id: &str) {
        let Some(color) = self.worms.get(id).map(|entry| entry.view.color) else {
            return;
        };
        self.strategies.remove(id);
        self.target_directions.remove(id);
        if self.insert_bot(id, color).is_none() {
            self.remove_worm(id);
            return;
        }
        debug!(worm_id = id, "bot respawned");
    }

    fn insert_bot(&mut self, id: &str, color: u32) -> Option<BotArchetype> {
        let archetypes = &self.config.bot_archetypes;
        let Some(&archetype) = archetypes.get(self.rng.pick_index(archetypes.len())) else {
            warn!(worm_id = id, "no bot archetype enabled, bot not spawned");
            return None;
        };
        let strategy = MovementStrategy::for_archetype(archetype, &self.config);

        let head = self.random_spawn_point();
        let worm = Worm {
            id: id.to_string(),
            nickname: format!("Bot-{}", archetype.label()),
            score: 0,
            kind: WormKind::Bot,
            bot_type: Some(archetype),
            segments: trailing_segments(
                head,
                self.config.segment_default_count,
                self.config.segment_spacing,
            ),
            direction: random_heading(&mut self.rng),
            is_sprinting: false,
            color,
            radius: self.config.segment_default_radius,
            is_dead: false,
            sprint_food_drop_timer: 0.0,
        };

        self.strategies.insert(id.to_string(), strategy);
        self.worms.insert(
            id.to_string(),
            WormInternal {
                view: worm.clone(),
                life: LifeState::Alive,
            },
        );
        self.events.push(OutboundEvent::WormJoined { worm });
        Some(archetype)
    }

    pub(super) fn create_player_worm(&mut self, id: &str, nickname: &str) -> Worm {
        let head = self.random_spawn_point();
        Worm {
            id: id.to_string(),
            nickname: nickname.to_string(),
            score: 0,
            kind: WormKind::Player,
            bot_type: None,
            segments: trailing_segments(
                head,
                self.config.segment_default_count,
                self.config.segment_spacing,
            ),
            direction: random_heading(&mut self.rng),
            is_sprinting: false,
            color: PLAYER_COLOR,
            radius: self.config.segment_default_radius,
            is_dead: false,
            sprint_food_drop_timer: 0.0,
        }
    }

    pub(super) fn remove_worm(&mut self, id: &str) -> Option<Worm> {
        self.target_directions.remove(id);
        self.strategies.remove(id);
        let entry = self.worms.remove(id)?;
        self.events.push(OutboundEvent::WormLeft { id: id.to_string() });
        Some(entry.view)
    }

    fn random_spawn_point(&mut self) -> Vec2 {
        random_point_inside(
            &mut self.rng,
            self.config.map_width,
            self.config.map_height,
            self.config.spawn_inset,
        )
    }
}
