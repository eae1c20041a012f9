use crate::constants::BOT_COLORS;
use crate::rng::Rng;
use crate::types::{Vec2, Worm};

pub(super) fn random_point_inside(rng: &mut Rng, width: f32, height: f32, inset: f32) -> Vec2 {
    Vec2::new(
        rng.range(inset, width - inset),
        rng.range(inset, height - inset),
    )
}

pub(super) fn random_heading(rng: &mut Rng) -> Vec2 {
    rng.signed_vector()
        .normalized()
        .unwrap_or(Vec2::new(1.0, 0.0))
}

pub(super) fn pick_bot_color(rng: &mut Rng) -> u32 {
    BOT_COLORS[rng.pick_index(BOT_COLORS.len())]
}

pub(super) fn trailing_segments(head: Vec2, count: usize, spacing: f32) -> Vec<Vec2> {
    (0..count.max(1))
        .map(|idx| Vec2::new(head.x - idx as f32 * spacing, head.y))
        .collect()
}

pub(super) fn death_drop_indices(segment_count: usize, drops: usize) -> Vec<usize> {
    if segment_count == 0 || drops == 0 {
        return Vec::new();
    }
    let stride = (segment_count / drops).max(1);
    (0..drops)
        .map(|idx| (idx * stride).min(segment_count - 1))
        .collect()
}

/// Closest distance from `point` to any non-head segment of `owner`.
pub(super) fn nearest_body_distance(point: Vec2, owner: &Worm) -> Option<f32> {
    owner
        .body()
        .iter()
        .map(|segment| point.distance(*segment))
        .min_by(f32::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_indices_spread_along_body() {
        assert_eq!(death_drop_indices(15, 5), vec![0, 3, 6, 9, 12]);
        assert_eq!(death_drop_indices(6, 3), vec![0, 2, 4]);
        assert!(death_drop_indices(10, 0).is_empty());
    }

    #[test]
    fn drop_indices_clamp_to_tail_when_short() {
        assert_eq!(death_drop_indices(3, 5), vec![0, 1, 2, 2, 2]);
    }

    #[test]
    fn trailing_segments_are_spaced() {
        let segments = trailing_segments(Vec2::new(100.0, 50.0), 3, 14.0);
        assert_eq!(
            segments,
            vec![
                Vec2::new(100.0, 50.0),
                Vec2::new(86.0, 50.0),
                Vec2::new(72.0, 50.0)
            ]
        );
    }

    #[test]
    fn random_points_respect_inset() {
        let mut rng = Rng::new(5);
        for _ in 0..500 {
            let point = random_point_inside(&mut rng, 400.0, 300.0, 50.0);
            assert!((50.0..=350.0).contains(&point.x));
            assert!((50.0..=250.0).contains(&point.y));
        }
    }

    #[test]
    fn bot_colors_come_from_palette() {
        let mut rng = Rng::new(11);
        for _ in 0..50 {
            assert!(BOT_COLORS.contains(&pick_bot_color(&mut rng)));
        }
    }
}
