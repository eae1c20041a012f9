use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::types::Vec2;

/// Signed shortest rotation from `current` to `target`, in `[-π, π]`.
pub fn angle_difference(current: f32, target: f32) -> f32 {
    let mut diff = (target - current) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    diff
}

pub fn vector_to_angle(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

pub fn angle_to_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

impl Vec2 {
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn normalized(self) -> Option<Vec2> {
        let length = self.length();
        if length > 0.0 && length.is_finite() {
            Some(Vec2::new(self.x / length, self.y / length))
        } else {
            None
        }
    }

    pub fn direction_to(self, target: Vec2) -> Option<Vec2> {
        (target - self).normalized()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}
