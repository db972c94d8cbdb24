//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter. One tick is one simulated second.
pub type Tick = u64;

pub const TICKS_PER_MINUTE: f64 = 60.0;
pub const TICKS_PER_HOUR: f64 = 3600.0;

/// Convert a duration in minutes to (fractional) ticks
pub fn minutes_to_ticks(minutes: f64) -> f64 {
    minutes * TICKS_PER_MINUTE
}

/// Convert a duration in hours to whole ticks
pub fn hours_to_ticks(hours: f64) -> Tick {
    (hours * TICKS_PER_HOUR).round().max(0.0) as Tick
}

/// Convert ticks to simulated minutes
pub fn ticks_to_minutes(ticks: Tick) -> f64 {
    ticks as f64 / TICKS_PER_MINUTE
}

/// 2D position or direction in site (pixel) coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero when the vector has no length
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 1e-9 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::default()
        }
    }

    /// True when both axis offsets to `other` are within `tolerance`
    pub fn within(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
