use super::*;

impl GameEngine {
    pub(super) fn feed_worm(&mut self, worm_id: &str, food_id: &str) -> bool {
        let Some(entry) = self.worms.get_mut(worm_id) else {
            return false;
        };
        if !entry.is_alive() || !self.foods.contains_key(food_id) {
            return false;
        }
        self.foods.remove(food_id);

        let worm = &mut entry.view;
        let tail = worm.tail();
        worm.segments.push(tail);
        worm.score += 1;
        worm.radius = radius_for_score(
            worm.score,
            self.config.segment_default_radius,
            self.config.segment_growth_radius,
        );

        self.eaten_this_tick.push(FoodEatenEntry {
            worm_id: worm_id.to_string(),
            food_id: food_id.to_string(),
        });
        true
    }

    pub(super) fn drain_sprint(&mut self, dt_ms: f32) {
        let interval = self.config.sprint_food_drop_interval_ms;
        let minimum_segments = self.config.segment_default_count;
        let mut drops: Vec<(Vec2, u32)> = Vec::new();

        for entry in self.worms.values_mut() {
            if !entry.is_alive() {
                continue;
            }
            let worm = &mut entry.view;
            if !can_pay_for_sprint(worm, minimum_segments) {
                worm.sprint_food_drop_timer = 0.0;
                continue;
            }

            worm.sprint_food_drop_timer += dt_ms;
            while worm.sprint_food_drop_timer >= interval {
                if !can_pay_for_sprint(worm, minimum_segments) {
                    worm.sprint_food_drop_timer = 0.0;
                    break;
                }
                let Some(tail) = worm.segments.pop() else {
                    break;
                };
                worm.score = worm.score.saturating_sub(1);
                worm.radius = radius_for_score(
                    worm.score,
                    self.config.segment_default_radius,
                    self.config.segment_growth_radius,
                );
                worm.sprint_food_drop_timer -= interval;
                drops.push((tail, worm.color));
            }
        }

        for (position, color) in drops {
            self.spawn_food(position, color);
        }
    }

    pub(super) fn scatter_remains(&mut self, segments: &[Vec2], score: u32, color: u32) -> usize {
        let indices = death_drop_indices(segments.len(), (score / 2) as usize);
        for &idx in &indices {
            self.spawn_food(segments[idx], color);
        }
        indices.len()
    }

    pub(super) fn top_up_food(&mut self) {
        let missing = self
            .config
            .minimum_food_count
            .saturating_sub(self.foods.len());
        for _ in 0..missing {
            let position = random_point_inside(
                &mut self.rng,
                self.config.map_width,
                self.config.map_height,
                self.config.food_spawn_inset,
            );
            self.spawn_food(position, self.config.food_color);
        }
        if missing > 0 {
            debug!(spawned = missing, total = self.foods.len(), "food topped up");
        }
    }

    fn spawn_food(&mut self, position: Vec2, color: u32) -> String {
        let id = self.make_id("food");
        self.foods.insert(
            id.clone(),
            Food {
                id: id.clone(),
                x: position.x,
                y: position.y,
                radius: self.config.food_radius,
                color,
            },
        );
        id
    }
}

fn can_pay_for_sprint(worm: &Worm, minimum_segments: usize) -> bool {
    worm.is_sprinting && worm.score > 0 && worm.segments.len() > minimum_segments
}
