//! Guards: patrol on a mission cycle and hold nearby entities for checks
//!
//! A guard spends `day / number_of_missions` ticks between missions. While on a
//! mission it moves at its check speed and, whenever it is not already busy,
//! stops up to `entities_per_check` unchecked entities inside its radius. Held
//! entities are released together when the check timer runs out.

use crate::core::config::{GuardBehaviour, GuardConfig, Site};
use crate::core::random::EntityRng;
use crate::core::types::{minutes_to_ticks, Tick, Vec2};
use crate::entity::body::Body;
use crate::entity::{CheckRelease, CheckTargets, CheckableId};

#[derive(Debug, Clone)]
pub struct Guard {
    id: usize,
    body: Body,
    initial_pos: Vec2,
    behaviour: GuardBehaviour,
    radius: f64,
    radius_sq: f64,
    check_range: (f64, f64),
    check_time: Tick,
    capacity: usize,
    holding: Vec<CheckableId>,
    in_mission: bool,
    mission: Tick,
    mission_range: (f64, f64),
    mission_period: Tick,
    wait_for_mission: Tick,
    stroll_speed: f64,
    check_speed: f64,
    speed: f64,
    checks: u32,
    rng: EntityRng,
}

impl Guard {
    pub fn new(id: usize, config: &GuardConfig, site: &Site, mut rng: EntityRng) -> Self {
        let pos = rng.point_in(site);
        let radius = config.check_radius * site.tile_size;
        let mission_period = site.day_ticks / u64::from(config.number_of_missions.max(1));
        let wait_for_mission = rng.uniform_ticks(0.0, mission_period as f64);
        let stroll_speed = config.stroll_speed * site.tile_size;

        tracing::debug!(
            "Created guard {} at ({:.1}, {:.1}), first mission in {:.2} minutes",
            id,
            pos.x,
            pos.y,
            wait_for_mission as f64 / 60.0
        );

        Self {
            id,
            body: Body::new(pos, site),
            initial_pos: pos,
            behaviour: config.behaviour,
            radius,
            radius_sq: radius * radius,
            check_range: (
                minutes_to_ticks(config.min_check_time),
                minutes_to_ticks(config.max_check_time),
            ),
            check_time: 0,
            capacity: config.entities_per_check as usize,
            holding: Vec::new(),
            in_mission: false,
            mission: 0,
            mission_range: (
                minutes_to_ticks(config.min_mission_time),
                minutes_to_ticks(config.max_mission_time),
            ),
            mission_period,
            wait_for_mission,
            stroll_speed,
            check_speed: config.check_speed * site.tile_size,
            speed: stroll_speed,
            checks: 0,
            rng,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn in_mission(&self) -> bool {
        self.in_mission
    }

    /// Entities currently held by this guard
    pub fn holding(&self) -> &[CheckableId] {
        &self.holding
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks started so far
    pub fn checks(&self) -> u32 {
        self.checks
    }

    pub fn tick(&mut self, targets: &mut CheckTargets<'_>, site: &Site) {
        self.advance_mission(site);

        if self.check_time > 0 {
            self.check_time -= 1;
            return;
        }

        if !self.holding.is_empty() {
            self.release_all(targets, site);
        }

        if !self.in_mission && self.behaviour == GuardBehaviour::Reset {
            return;
        }

        let speed = self.speed;
        self.body.wander(&mut self.rng, speed, site);

        if self.in_mission {
            self.perform_check(targets);
        }
    }

    fn advance_mission(&mut self, site: &Site) {
        if !self.in_mission {
            if self.wait_for_mission > 0 {
                self.wait_for_mission -= 1;
            } else {
                self.start_mission();
            }
        } else if self.mission > 0 {
            self.mission -= 1;
        } else {
            self.stop_mission(site);
        }
    }

    fn start_mission(&mut self) {
        let (min, max) = self.mission_range;
        self.in_mission = true;
        self.speed = self.check_speed;
        self.mission = self.rng.uniform_ticks(min, max);
        tracing::debug!(
            "Guard {} starts a {:.2} minute mission",
            self.id,
            self.mission as f64 / 60.0
        );
    }

    fn stop_mission(&mut self, site: &Site) {
        self.in_mission = false;
        self.speed = self.stroll_speed;
        self.wait_for_mission = self.mission_period;
        if self.behaviour == GuardBehaviour::Reset {
            self.body.teleport(self.initial_pos, site);
        }
        tracing::debug!("Guard {} ends its mission", self.id);
    }

    fn release_all(&mut self, targets: &mut CheckTargets<'_>, site: &Site) {
        let release = CheckRelease {
            guard_pos: self.body.pos,
            radius: self.radius,
        };
        for id in self.holding.drain(..) {
            if let Some(entity) = targets.get_mut(id) {
                entity.stop_check(&release, site);
            }
        }
    }

    fn perform_check(&mut self, targets: &mut CheckTargets<'_>) {
        if !self.holding.is_empty() || self.capacity == 0 {
            return;
        }

        let pos = self.body.pos;
        let mut candidates: Vec<CheckableId> = targets
            .ids()
            .into_iter()
            .filter(|&id| {
                targets.get(id).is_some_and(|entity| {
                    !entity.is_being_checked()
                        && entity.position().distance_squared(&pos) <= self.radius_sq
                })
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        while self.holding.len() < self.capacity && !candidates.is_empty() {
            let pick = self.rng.index(candidates.len());
            let id = candidates.swap_remove(pick);
            if let Some(entity) = targets.get_mut(id) {
                entity.start_check();
                self.holding.push(id);
            }
        }

        let (min, max) = self.check_range;
        self.check_time = self.rng.uniform_ticks(min, max);
        self.checks += 1;
        tracing::debug!(
            "Guard {} checks {} entities for {:.2} minutes",
            self.id,
            self.holding.len(),
            self.check_time as f64 / 60.0
        );
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, pos: Vec2) {
        self.body.pos = pos;
    }

    #[cfg(test)]
    pub(crate) fn force_mission(&mut self) {
        self.start_mission();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{EmployeeBehaviour, EmployeeConfig};
    use crate::entity::{Checkable, Employee};

    fn site() -> Site {
        Site {
            tile_size: 16.0,
            half_tile: 8.0,
            width: 640.0,
            height: 480.0,
            day_ticks: 8 * 3600,
            cycles_per_frame: 1,
        }
    }

    fn guard_config(behaviour: GuardBehaviour, capacity: u32) -> GuardConfig {
        GuardConfig {
            behaviour,
            check_radius: 3.0,
            max_check_time: 2.0,
            min_check_time: 1.0,
            number_of_missions: 4,
            max_mission_time: 600.0,
            min_mission_time: 500.0,
            stroll_speed: 0.0,
            check_speed: 0.0,
            entities_per_check: capacity,
        }
    }

    /// Employees that never move, spawned exactly on the site centre
    fn still_employees(n: usize) -> Vec<Employee> {
        let config = EmployeeConfig {
            number_of_employees: n as u32,
            behaviour: EmployeeBehaviour::Stay,
            max_stay_time: 600.0,
            min_stay_time: 600.0,
            speed: 0.0,
            randomization: 0.0,
        };
        let site = site();
        (0..n)
            .map(|i| Employee::new(i, &config, &site, EntityRng::from_seed(i as u64)))
            .collect()
    }

    #[test]
    fn test_mission_period_splits_day() {
        let guard = Guard::new(0, &guard_config(GuardBehaviour::Stroll, 1), &site(), EntityRng::from_seed(1));
        assert_eq!(guard.mission_period, 7200);
        assert!(guard.wait_for_mission <= 7200);
        assert!(!guard.in_mission());
    }

    #[test]
    fn test_checks_exactly_capacity() {
        let site = site();
        let mut employees = still_employees(3);
        let mut guard = Guard::new(0, &guard_config(GuardBehaviour::Stroll, 2), &site, EntityRng::from_seed(2));
        guard.place(site.center());
        guard.force_mission();

        let mut targets = CheckTargets::new(&mut employees, None);
        guard.tick(&mut targets, &site);

        assert_eq!(guard.holding().len(), 2);
        assert_eq!(targets.held_count(), 2);
        assert_eq!(guard.checks(), 1);
    }

    #[test]
    fn test_release_frees_every_held_entity() {
        let site = site();
        let mut employees = still_employees(3);
        let mut guard = Guard::new(0, &guard_config(GuardBehaviour::Stroll, 2), &site, EntityRng::from_seed(3));
        guard.place(site.center());
        guard.force_mission();

        {
            let mut targets = CheckTargets::new(&mut employees, None);
            guard.tick(&mut targets, &site);
            assert_eq!(targets.held_count(), 2);
            // Check time is at most 120 ticks
            for _ in 0..120 {
                guard.tick(&mut targets, &site);
            }
            assert!(guard.holding().len() <= 2);
        }
        // Capacity 2 with 3 candidates: every release frees both at once
        let held = employees.iter().filter(|e| e.is_being_checked()).count();
        assert!(held == 0 || held == 2, "held {}", held);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let site = site();
        let mut employees = still_employees(6);
        let mut guard = Guard::new(0, &guard_config(GuardBehaviour::Stroll, 3), &site, EntityRng::from_seed(4));
        guard.place(site.center());
        guard.force_mission();

        let mut targets = CheckTargets::new(&mut employees, None);
        for _ in 0..5000 {
            guard.tick(&mut targets, &site);
            assert!(guard.holding().len() <= 3);
            assert_eq!(targets.held_count(), guard.holding().len());
        }
        assert!(guard.checks() > 1);
    }

    #[test]
    fn test_out_of_radius_is_ignored() {
        let site = site();
        let mut employees = still_employees(2);
        let mut guard = Guard::new(0, &guard_config(GuardBehaviour::Stroll, 2), &site, EntityRng::from_seed(5));
        guard.place(Vec2::new(20.0, 20.0));
        guard.force_mission();

        let mut targets = CheckTargets::new(&mut employees, None);
        guard.tick(&mut targets, &site);
        assert!(guard.holding().is_empty());
        assert_eq!(guard.checks(), 0);
    }

    #[test]
    fn test_idle_reset_guard_stays_put() {
        let site = site();
        let mut employees = still_employees(1);
        let mut config = guard_config(GuardBehaviour::Reset, 1);
        config.stroll_speed = 1.0;
        let mut guard = Guard::new(0, &config, &site, EntityRng::from_seed(6));
        // Long enough wait that no mission starts during the test
        guard.wait_for_mission = 10_000;
        let pos = guard.pos();

        let mut targets = CheckTargets::new(&mut employees, None);
        for _ in 0..100 {
            guard.tick(&mut targets, &site);
        }
        assert_eq!(guard.pos(), pos);
        assert!(!guard.in_mission());
    }

    #[test]
    fn test_reset_guard_returns_after_mission() {
        let site = site();
        let mut employees: Vec<Employee> = Vec::new();
        let mut config = guard_config(GuardBehaviour::Reset, 1);
        config.check_speed = 1.0;
        config.min_mission_time = 1.0;
        config.max_mission_time = 1.0;
        let mut guard = Guard::new(0, &config, &site, EntityRng::from_seed(7));
        let start = guard.pos();
        guard.force_mission();

        let mut targets = CheckTargets::new(&mut employees, None);
        for _ in 0..60 {
            guard.tick(&mut targets, &site);
        }
        assert!(guard.in_mission());
        guard.tick(&mut targets, &site);
        assert!(!guard.in_mission());
        assert_eq!(guard.pos(), start);
    }
}
