//! Site entities and the check capability guards act on
//!
//! Attackers and employees are "checkable": a guard can hold them in place for
//! a while. Guards reach them through [`CheckTargets`], a borrowed view over the
//! level's employees and attacker addressed by [`CheckableId`], so no entity
//! keeps a reference to another.

pub mod attacker;
pub mod body;
pub mod door;
pub mod employee;
pub mod guard;

pub use attacker::{Attacker, AttackerPhase, Verdict};
pub use body::Body;
pub use door::{Door, DoorStats};
pub use employee::Employee;
pub use guard::Guard;

use crate::core::config::Site;
use crate::core::types::Vec2;

/// Where a guard stood when it let an entity go
#[derive(Debug, Clone, Copy)]
pub struct CheckRelease {
    pub guard_pos: Vec2,
    /// Check radius in site units (not squared)
    pub radius: f64,
}

/// An entity a guard can stop and hold
pub trait Checkable {
    fn position(&self) -> Vec2;

    fn is_being_checked(&self) -> bool;

    /// Called once when a guard starts holding the entity
    fn start_check(&mut self);

    /// Called once when the holding guard releases the entity
    fn stop_check(&mut self, release: &CheckRelease, site: &Site);
}

/// Address of a checkable entity inside a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckableId {
    Employee(usize),
    Attacker,
}

/// Every entity guards may check during one tick
pub struct CheckTargets<'a> {
    employees: &'a mut [Employee],
    attacker: Option<&'a mut Attacker>,
}

impl<'a> CheckTargets<'a> {
    pub fn new(employees: &'a mut [Employee], attacker: Option<&'a mut Attacker>) -> Self {
        Self {
            employees,
            attacker,
        }
    }

    /// Ids in level order: employees first, then the attacker
    pub fn ids(&self) -> Vec<CheckableId> {
        let mut ids: Vec<CheckableId> = (0..self.employees.len())
            .map(CheckableId::Employee)
            .collect();
        if self.attacker.is_some() {
            ids.push(CheckableId::Attacker);
        }
        ids
    }

    pub fn get(&self, id: CheckableId) -> Option<&dyn Checkable> {
        match id {
            CheckableId::Employee(i) => self.employees.get(i).map(|e| e as &dyn Checkable),
            CheckableId::Attacker => self.attacker.as_deref().map(|a| a as &dyn Checkable),
        }
    }

    pub fn get_mut(&mut self, id: CheckableId) -> Option<&mut dyn Checkable> {
        match id {
            CheckableId::Employee(i) => self
                .employees
                .get_mut(i)
                .map(|e| e as &mut dyn Checkable),
            CheckableId::Attacker => self
                .attacker
                .as_deref_mut()
                .map(|a| a as &mut dyn Checkable),
        }
    }

    /// Number of entities currently held by any guard
    pub fn held_count(&self) -> usize {
        self.ids()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|c| c.is_being_checked()))
            .count()
    }
}
