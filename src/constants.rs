pub const TICK_RATE: u32 = 30;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAP_WIDTH: f32 = 15_000.0;
pub const MAP_HEIGHT: f32 = 10_000.0;
pub const SPAWN_INSET: f32 = 100.0;
pub const FOOD_SPAWN_INSET: f32 = 50.0;

pub const HEAD_SPEED: f32 = 350.0;
pub const HEAD_SPRINT_SPEED: f32 = 550.0;
pub const SPRINT_FOOD_DROP_INTERVAL_MS: f32 = 500.0;
pub const TURN_RATE: f32 = 5.0;

pub const BOT_COUNT: usize = 6;
pub const FOOD_SEEKER_WANDER_CHANCE: f32 = 0.05;

pub const SEGMENT_SPACING: f32 = 14.0;
pub const SEGMENT_DEFAULT_COUNT: usize = 5;
pub const SEGMENT_DEFAULT_RADIUS: f32 = 40.0;
pub const SEGMENT_GROWTH_RADIUS: f32 = 1.5;

pub const FOOD_RADIUS: f32 = 30.0;
pub const MINIMUM_FOOD_COUNT: usize = 200;
pub const FOOD_COLOR: u32 = 0xff3333;

pub const MAX_COLLISION_TOLERANCE: f32 = 25.0;

pub const PLAYER_COLOR: u32 = 0xff0000;
pub const BOT_COLORS: [u32; 5] = [0x00ff00, 0x0000ff, 0xffff00, 0xff00ff, 0x00ffff];

pub const NICKNAME_MAX_CHARS: usize = 16;

pub fn radius_for_score(score: u32, base_radius: f32, growth_per_point: f32) -> f32 {
    base_radius + score as f32 * growth_per_point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_grows_linearly_with_score() {
        assert_eq!(radius_for_score(0, 40.0, 1.5), 40.0);
        assert_eq!(radius_for_score(11, 40.0, 1.5), 56.5);
    }

    #[test]
    fn tick_ms_matches_tick_rate() {
        assert_eq!(TICK_MS, 33);
    }
}
