use super::*;
use crate::geometry::{angle_difference, angle_to_vector, vector_to_angle};

impl GameEngine {
    pub(super) fn update_bot_directions(&mut self) {
        let worms: Vec<&Worm> = self.worms.values().map(|entry| &entry.view).collect();
        let foods: Vec<&Food> = self.foods.values().collect();

        let mut decisions = Vec::new();
        for bot in worms.iter().filter(|worm| worm.is_bot() && !worm.is_dead) {
            let Some(strategy) = self.strategies.get(&bot.id) else {
                continue;
            };
            if let Some(direction) = strategy.decide(bot, &worms, &foods, &mut self.rng) {
                decisions.push((bot.id.clone(), direction));
            }
        }

        for (id, direction) in decisions {
            self.target_directions.insert(id, direction);
        }
    }

    pub(super) fn advance_worms(&mut self, dt_sec: f32) {
        let max_turn = self.config.turn_rate * dt_sec;
        for (id, entry) in self.worms.iter_mut() {
            if !entry.is_alive() {
                continue;
            }
            let worm = &mut entry.view;
            if let Some(target) = self.target_directions.get(id) {
                worm.direction = turn_toward(worm.direction, *target, max_turn);
            }
            let speed = if worm.is_sprinting && worm.score > 0 {
                self.config.head_sprint_speed
            } else {
                self.config.head_speed
            };
            advance_head(worm, speed, dt_sec);
            chain_segments(&mut worm.segments, self.config.segment_spacing);
        }
    }
}

pub fn turn_toward(direction: Vec2, target: Vec2, max_turn: f32) -> Vec2 {
    let current = vector_to_angle(direction);
    let diff = angle_difference(current, vector_to_angle(target));
    if diff.abs() <= max_turn {
        target
    } else {
        angle_to_vector(current + max_turn.copysign(diff))
    }
}

pub fn advance_head(worm: &mut Worm, speed: f32, dt_sec: f32) {
    let Some(heading) = worm.direction.normalized() else {
        return;
    };
    if let Some(head) = worm.segments.first_mut() {
        *head += heading * (speed * dt_sec);
    }
}

pub fn chain_segments(segments: &mut [Vec2], spacing: f32) {
    for idx in 1..segments.len() {
        let offset = segments[idx - 1] - segments[idx];
        let distance = offset.length();
        if distance > spacing {
            segments[idx] += offset * ((distance - spacing) / distance);
        }
    }
}
