//! Site composition: every entity of one trial and the per-tick update order

use crate::core::config::{GameConfig, Site};
use crate::core::error::Result;
use crate::core::random::RngStreams;
use crate::entity::{Attacker, CheckTargets, Door, DoorStats, Employee, Guard, Verdict};

/// All entities of one trial
///
/// Built fresh for every trial and dropped when the trial ends.
#[derive(Debug, Clone)]
pub struct Level {
    site: Site,
    doors: Vec<Door>,
    employees: Vec<Employee>,
    guards: Vec<Guard>,
    attacker: Attacker,
}

impl Level {
    /// Build a level from a validated configuration and a trial seed
    ///
    /// Streams are drawn in a fixed order (doors, employees, attacker, guards)
    /// so the same seed always produces the same trial.
    pub fn new(config: &GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let site = config.site();
        let mut streams = RngStreams::new(seed);

        let doors = config
            .doors
            .iter()
            .enumerate()
            .map(|(id, door)| Door::new(id, door, &site, streams.next_stream()))
            .collect();

        let employees = (0..config.employees.number_of_employees as usize)
            .map(|id| Employee::new(id, &config.employees, &site, streams.next_stream()))
            .collect();

        let attacker = Attacker::new(&config.attacker, &site, streams.next_stream());

        let mut guards = Vec::with_capacity(config.guards.number_of_guards as usize);
        for id in 0..config.guards.number_of_guards as usize {
            if let Some(template) = config.guards.template(id) {
                guards.push(Guard::new(id, template, &site, streams.next_stream()));
            }
        }

        Ok(Self {
            site,
            doors,
            employees,
            guards,
            attacker,
        })
    }

    /// Advance every entity by one tick: employees, guards, doors, attacker
    pub fn run(&mut self) {
        let site = &self.site;

        for employee in self.employees.iter_mut() {
            employee.tick(site);
        }

        let mut targets = CheckTargets::new(&mut self.employees, Some(&mut self.attacker));
        for guard in self.guards.iter_mut() {
            guard.tick(&mut targets, site);
        }

        for door in self.doors.iter_mut() {
            door.tick();
        }

        self.attacker.tick(&mut self.doors, site);
    }

    /// Terminal signal raised by the attacker, if any
    pub fn verdict(&self) -> Option<Verdict> {
        self.attacker.verdict()
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn attacker(&self) -> &Attacker {
        &self.attacker
    }

    /// Attacker `(successes, failures)`
    pub fn result(&self) -> (u32, u32) {
        self.attacker.result()
    }

    /// Entry statistics summed over every door
    pub fn door_stats(&self) -> DoorStats {
        let mut total = DoorStats::default();
        for door in &self.doors {
            total += door.stats();
        }
        total
    }

    /// Entities currently held by some guard
    pub fn held_count(&mut self) -> usize {
        CheckTargets::new(&mut self.employees, Some(&mut self.attacker)).held_count()
    }
}
