use std::collections::HashSet;

use super::*;

impl GameEngine {
    pub(super) fn resolve_bot_food(&mut self) {
        let mut claimed: HashSet<String> = HashSet::new();
        let mut meals: Vec<(String, String)> = Vec::new();

        for entry in self.worms.values() {
            if !entry.is_alive() || !entry.view.is_bot() {
                continue;
            }
            let head = entry.view.head();
            for food in self.foods.values() {
                if claimed.contains(&food.id) {
                    continue;
                }
                if head.distance(food.position()) < entry.view.radius + food.radius {
                    claimed.insert(food.id.clone());
                    meals.push((entry.view.id.clone(), food.id.clone()));
                }
            }
        }

        for (worm_id, food_id) in meals {
            self.feed_worm(&worm_id, &food_id);
        }
    }

    pub(super) fn sweep_worm_collisions(&mut self) {
        let sweep_players = self.config.server_authoritative_players;
        let mut candidates: Vec<(String, String)> = Vec::new();

        for striker in self.worms.values() {
            if !striker.is_alive() || (striker.view.is_player() && !sweep_players) {
                continue;
            }
            let head = striker.view.head();
            for victim in self.worms.values() {
                if victim.view.id == striker.view.id || !victim.is_alive() {
                    continue;
                }
                let Some(distance) = nearest_body_distance(head, &victim.view) else {
                    continue;
                };
                if distance < striker.view.radius + victim.view.radius {
                    candidates.push((striker.view.id.clone(), victim.view.id.clone()));
                }
            }
        }

        let mut killed_this_tick: HashSet<String> = HashSet::new();
        for (killed_id, killer_id) in candidates {
            if killed_this_tick.insert(killed_id.clone()) {
                self.kill_worm(&killed_id, &killer_id);
            }
        }
    }

    pub(super) fn validate_food_report(
        &self,
        worm_id: &str,
        food_id: &str,
    ) -> Result<(), ReportRejection> {
        let worm = self.live_worm(worm_id)?;
        let food = self
            .foods
            .get(food_id)
            .ok_or_else(|| ReportRejection::UnknownFood(food_id.to_string()))?;

        let distance = worm.head().distance(food.position());
        let allowed = worm.radius + food.radius + self.config.collision_tolerance;
        if distance > allowed {
            return Err(ReportRejection::OutOfRange { distance, allowed });
        }
        Ok(())
    }

    pub(super) fn validate_collision_report(
        &self,
        reporter_id: &str,
        collider_id: &str,
    ) -> Result<(), ReportRejection> {
        if reporter_id == collider_id {
            return Err(ReportRejection::SelfCollision(reporter_id.to_string()));
        }
        let reporter = self
            .worms
            .get(reporter_id)
            .map(|entry| &entry.view)
            .ok_or_else(|| ReportRejection::UnknownWorm(reporter_id.to_string()))?;
        let collider = self.live_worm(collider_id)?;

        let allowed = collider.radius + reporter.radius + self.config.collision_tolerance;
        let distance = nearest_body_distance(collider.head(), reporter).unwrap_or(f32::INFINITY);
        if distance > allowed {
            return Err(ReportRejection::OutOfRange { distance, allowed });
        }
        Ok(())
    }

    fn live_worm(&self, worm_id: &str) -> Result<&Worm, ReportRejection> {
        let entry = self
            .worms
            .get(worm_id)
            .ok_or_else(|| ReportRejection::UnknownWorm(worm_id.to_string()))?;
        if !entry.is_alive() {
            return Err(ReportRejection::DeadWorm(worm_id.to_string()));
        }
        Ok(&entry.view)
    }

    /// Marks the worm dead, scatters its food and announces the death. Returns
    /// `false` when the worm is missing or already dead.
    pub(super) fn kill_worm(&mut self, worm_id: &str, killer_id: &str) -> bool {
        let at_tick = self.tick_counter;
        let Some(entry) = self.worms.get_mut(worm_id) else {
            return false;
        };
        if !entry.is_alive() {
            return false;
        }
        entry.life = LifeState::Dead {
            killer_id: killer_id.to_string(),
            at_tick,
        };
        entry.view.is_dead = true;
        entry.view.is_sprinting = false;

        let segments = entry.view.segments.clone();
        let score = entry.view.score;
        let color = entry.view.color;
        let dropped = self.scatter_remains(&segments, score, color);

        info!(
            killed_id = worm_id,
            killer_id, score, dropped, tick = at_tick, "worm died"
        );
        self.events.push(OutboundEvent::WormDied {
            killed_id: worm_id.to_string(),
            killer_id: killer_id.to_string(),
        });
        true
    }
}
