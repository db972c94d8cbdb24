//! The intruder
//!
//! The attacker cools down, picks a door at random, travels to it and tries to
//! get through. What happens after an attempt depends on the strategy:
//!
//! - `normal`: the first attempt settles the trial either way.
//! - `p-test`: every attempt is counted and the attacker starts over from a
//!   random spot; the trial is never settled by the attacker.
//! - `q-test`: a success settles the trial, failures are retried until the day
//!   runs out.
//!
//! Being caught by a guard settles `normal` and `q-test` trials as a loss.

use crate::core::config::{AttackerBehaviour, AttackerConfig, Site, Strategy};
use crate::core::random::EntityRng;
use crate::core::types::{minutes_to_ticks, Tick, Vec2};
use crate::entity::body::Body;
use crate::entity::door::Door;
use crate::entity::{CheckRelease, Checkable};

/// How a trial was settled by the attacker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Crossed an open inter-level door
    Won,
    /// Caught, or (under `normal`) blocked by a closed door
    Lost,
}

impl Verdict {
    pub fn is_win(&self) -> bool {
        matches!(self, Verdict::Won)
    }
}

/// Observable phase of the attacker's cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackerPhase {
    /// Held by a guard
    Held,
    /// Dwelling after an attempt
    Staying,
    /// Cooling down before the next attempt
    Waiting,
    /// Ready, no door chosen
    Seeking,
    /// On the way to the chosen door
    Traveling,
    /// Trial settled
    Done,
}

#[derive(Debug, Clone)]
pub struct Attacker {
    body: Body,
    behaviour: AttackerBehaviour,
    strategy: Strategy,
    travel_speed: f64,
    target: Option<usize>,
    successes: u32,
    failures: u32,
    captures: u32,
    attempts: u32,
    stay_period: Tick,
    attack_period: Tick,
    stay_time: Tick,
    wait_time: Tick,
    verdict: Option<Verdict>,
    rng: EntityRng,
}

impl Attacker {
    pub fn new(config: &AttackerConfig, site: &Site, mut rng: EntityRng) -> Self {
        let jitter = config.randomization.unwrap_or(0.0) * site.tile_size;
        let start = Vec2::new(
            config.x + rng.uniform(-jitter, jitter),
            config.y + rng.uniform(-jitter, jitter),
        );

        let stay_period = minutes_to_ticks(config.stay_period).round().max(0.0) as Tick;
        let attack_period = minutes_to_ticks(config.attack_period).round().max(0.0) as Tick;
        let travel_speed = config.attack_speed.unwrap_or(config.speed) * site.tile_size;

        tracing::debug!(
            "Created attacker at ({:.1}, {:.1}) waiting {:.2} minutes",
            start.x,
            start.y,
            attack_period as f64 / 60.0
        );

        Self {
            body: Body::new(start, site),
            behaviour: config.behaviour,
            strategy: config.strategy,
            travel_speed,
            target: None,
            successes: 0,
            failures: 0,
            captures: 0,
            attempts: 0,
            stay_period,
            attack_period,
            stay_time: 0,
            wait_time: attack_period,
            verdict: None,
            rng,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Settled outcome, if any. Set at most once per trial.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// `(successes, failures)`; only counted under `p-test`
    pub fn result(&self) -> (u32, u32) {
        (self.successes, self.failures)
    }

    /// Arrivals at a door, under every strategy
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Times a guard stopped the attacker under `p-test`
    pub fn captures(&self) -> u32 {
        self.captures
    }

    pub fn phase(&self) -> AttackerPhase {
        if self.verdict.is_some() {
            AttackerPhase::Done
        } else if self.body.is_being_checked() {
            AttackerPhase::Held
        } else if self.stay_time > 0 {
            AttackerPhase::Staying
        } else if self.wait_time > 0 {
            AttackerPhase::Waiting
        } else if self.target.is_some() {
            AttackerPhase::Traveling
        } else {
            AttackerPhase::Seeking
        }
    }

    pub fn tick(&mut self, doors: &mut [Door], site: &Site) {
        if self.verdict.is_some() || self.body.is_being_checked() {
            return;
        }

        // Both timers run together; staying also blocks movement
        if self.wait_time > 0 {
            self.wait_time -= 1;
        }
        if self.stay_time > 0 {
            self.stay_time -= 1;
            return;
        }
        if self.wait_time > 0 {
            return;
        }

        let Some(index) = self.select_door(doors) else {
            // Nothing to attack: idle in place
            return;
        };
        let door = &mut doors[index];
        let goal = door.midpoint();

        if !self.body.pos.within(&goal, site.half_tile) {
            match self.behaviour {
                AttackerBehaviour::Jump => self.body.teleport(goal, site),
                AttackerBehaviour::Walk => self.body.step_toward(goal, self.travel_speed, site),
            }
        }

        if self.body.pos.within(&goal, site.half_tile) {
            self.attempt(door, site);
        }
    }

    fn select_door(&mut self, doors: &[Door]) -> Option<usize> {
        if self.target.is_none() && !doors.is_empty() {
            let index = self.rng.index(doors.len());
            tracing::debug!("Attacker selected door {}", doors[index].id());
            self.target = Some(index);
        }
        self.target.filter(|&i| i < doors.len())
    }

    fn attempt(&mut self, door: &mut Door, site: &Site) {
        self.attempts += 1;
        let success = door.enter() && door.to_next_level();

        match (success, self.strategy) {
            (true, Strategy::PTest) => {
                self.successes += 1;
                self.reposition(site);
            }
            (true, _) => {
                tracing::debug!("Door {} open, attack succeeded", door.id());
                self.settle(Verdict::Won);
                return;
            }
            (false, Strategy::PTest) => {
                self.failures += 1;
                self.reposition(site);
            }
            (false, Strategy::Normal) => {
                tracing::debug!("Door {} blocked, attack failed", door.id());
                self.settle(Verdict::Lost);
                return;
            }
            (false, Strategy::QTest) => {
                tracing::debug!(
                    "Door {} blocked, retrying in {:.2} minutes",
                    door.id(),
                    self.attack_period as f64 / 60.0
                );
            }
        }

        self.target = None;
        self.wait_time = self.attack_period;
        self.stay_time = self.stay_period;
    }

    fn reposition(&mut self, site: &Site) {
        let pos = self.rng.point_in(site);
        self.body.teleport(pos, site);
    }

    fn settle(&mut self, verdict: Verdict) {
        if self.verdict.is_none() {
            self.verdict = Some(verdict);
        }
    }
}

impl Checkable for Attacker {
    fn position(&self) -> Vec2 {
        self.body.pos
    }

    fn is_being_checked(&self) -> bool {
        self.body.is_being_checked()
    }

    fn start_check(&mut self) {
        self.body.set_being_checked(true);
        match self.strategy {
            Strategy::PTest => self.captures += 1,
            Strategy::Normal | Strategy::QTest => {
                tracing::debug!("Attacker was caught");
                self.settle(Verdict::Lost);
            }
        }
    }

    fn stop_check(&mut self, _release: &CheckRelease, _site: &Site) {
        self.body.set_being_checked(false);
    }
}
