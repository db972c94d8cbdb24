//! Employees: background traffic guards also stop

use crate::core::config::{EmployeeBehaviour, EmployeeConfig, Site};
use crate::core::random::EntityRng;
use crate::core::types::{minutes_to_ticks, Tick, Vec2};
use crate::entity::body::Body;
use crate::entity::{CheckRelease, Checkable};

#[derive(Debug, Clone)]
pub struct Employee {
    id: usize,
    body: Body,
    behaviour: EmployeeBehaviour,
    speed: f64,
    stay_range: (f64, f64),
    goal: Option<Vec2>,
    stay_time: Tick,
    rng: EntityRng,
}

impl Employee {
    pub fn new(id: usize, config: &EmployeeConfig, site: &Site, mut rng: EntityRng) -> Self {
        let spread = config.randomization * site.tile_size;
        let center = site.center();
        let start = Vec2::new(
            center.x + rng.uniform(-spread, spread),
            center.y + rng.uniform(-spread, spread),
        );

        Self {
            id,
            body: Body::new(start, site),
            behaviour: config.behaviour,
            speed: config.speed * site.tile_size,
            stay_range: (
                minutes_to_ticks(config.min_stay_time),
                minutes_to_ticks(config.max_stay_time),
            ),
            goal: None,
            stay_time: 0,
            rng,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn goal(&self) -> Option<Vec2> {
        self.goal
    }

    pub fn stay_time(&self) -> Tick {
        self.stay_time
    }

    pub fn tick(&mut self, site: &Site) {
        if self.body.is_being_checked() {
            return;
        }
        if self.stay_time > 0 {
            self.stay_time -= 1;
            return;
        }

        let goal = match self.goal {
            Some(goal) => goal,
            None => {
                let goal = self.rng.point_in(site);
                self.goal = Some(goal);
                goal
            }
        };

        self.body.step_toward(goal, self.speed, site);

        if self.body.pos.within(&goal, site.half_tile) {
            let (min, max) = self.stay_range;
            self.stay_time = self.rng.uniform_ticks(min, max);
            self.goal = None;
        }
    }
}

impl Checkable for Employee {
    fn position(&self) -> Vec2 {
        self.body.pos
    }

    fn is_being_checked(&self) -> bool {
        self.body.is_being_checked()
    }

    fn start_check(&mut self) {
        self.body.set_being_checked(true);
    }

    fn stop_check(&mut self, release: &CheckRelease, site: &Site) {
        self.body.set_being_checked(false);
        if self.behaviour != EmployeeBehaviour::Walk {
            return;
        }

        // Step out of the guard's radius so the next check picks someone else
        let mut away = (self.body.pos - release.guard_pos).normalize();
        if away == Vec2::default() {
            away = self.rng.jitter().normalize();
        }
        let mut target = release.guard_pos + away * (release.radius + site.half_tile);
        if target.x < 0.0 || target.x > site.width {
            target.x = release.guard_pos.x - away.x * (release.radius + site.half_tile);
        }
        if target.y < 0.0 || target.y > site.height {
            target.y = release.guard_pos.y - away.y * (release.radius + site.half_tile);
        }
        self.body.teleport(target, site);
    }
}
