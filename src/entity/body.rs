//! Physical presence shared by every moving entity

use crate::core::config::Site;
use crate::core::random::EntityRng;
use crate::core::types::Vec2;

/// Position, heading and check flag of a mobile entity
#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    /// Last heading; zero while the entity has not moved
    pub direction: Vec2,
    being_checked: bool,
}

impl Body {
    pub fn new(pos: Vec2, site: &Site) -> Self {
        Self {
            pos: site.constrain(pos),
            direction: Vec2::default(),
            being_checked: false,
        }
    }

    pub fn is_being_checked(&self) -> bool {
        self.being_checked
    }

    pub fn set_being_checked(&mut self, checked: bool) {
        self.being_checked = checked;
    }

    /// Move up to `speed` units toward `goal`, landing on it when close enough
    pub fn step_toward(&mut self, goal: Vec2, speed: f64, site: &Site) {
        let delta = goal - self.pos;
        if delta.length() <= speed {
            self.direction = delta.normalize();
            self.pos = site.constrain(goal);
            return;
        }

        self.direction = delta.normalize();
        self.pos = site.constrain(self.pos + self.direction * speed);
    }

    /// Random-walk step: each axis of the heading is drawn uniformly in `[-1, 1)`
    pub fn wander(&mut self, rng: &mut EntityRng, speed: f64, site: &Site) {
        if self.being_checked {
            return;
        }

        self.direction = rng.jitter();
        self.pos = site.constrain(self.pos + self.direction * speed);
    }

    pub fn teleport(&mut self, pos: Vec2, site: &Site) {
        self.pos = site.constrain(pos);
    }
}
