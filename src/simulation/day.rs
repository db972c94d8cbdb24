//! One simulated day: runs a level until the attacker settles it or the day ends

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::types::Tick;
use crate::entity::DoorStats;
use crate::simulation::level::Level;

/// Cooperative stop flag shared between the harness and whoever may interrupt it
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one completed trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    /// Attacker win; also true when the day ran out
    pub success: bool,
    pub ticks_elapsed: Tick,
    pub attacker_successes: u32,
    pub attacker_failures: u32,
    pub captures: u32,
    pub door_stats: DoorStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayResult {
    Completed(TrialOutcome),
    /// Stopped from outside before the trial finished; never counted
    Aborted { ticks: Tick },
}

pub struct DaySimulation {
    level: Level,
    ticks: Tick,
}

impl DaySimulation {
    pub fn new(level: Level) -> Self {
        Self { level, ticks: 0 }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn ticks(&self) -> Tick {
        self.ticks
    }

    /// Run the day to completion, polling `stop` once per frame
    pub fn run(&mut self, stop: &StopHandle) -> DayResult {
        let day_ticks = self.level.site().day_ticks;
        let cycles = self.level.site().cycles_per_frame.max(1);

        loop {
            if stop.is_stopped() {
                return DayResult::Aborted { ticks: self.ticks };
            }

            for _ in 0..cycles {
                if let Some(verdict) = self.level.verdict() {
                    return DayResult::Completed(self.outcome(verdict.is_win()));
                }
                if self.ticks >= day_ticks {
                    return DayResult::Completed(self.outcome(true));
                }

                self.level.run();
                self.ticks += 1;
            }
        }
    }

    fn outcome(&self, success: bool) -> TrialOutcome {
        let (attacker_successes, attacker_failures) = self.level.result();
        TrialOutcome {
            success,
            ticks_elapsed: self.ticks,
            attacker_successes,
            attacker_failures,
            captures: self.level.attacker().captures(),
            door_stats: self.level.door_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::tests::LEVEL_JSON;
    use crate::core::config::{GameConfig, Strategy};

    fn config() -> GameConfig {
        GameConfig::from_json(LEVEL_JSON).unwrap()
    }

    #[test]
    fn test_ptest_day_runs_to_the_end() {
        let mut config = config();
        config.day_duration = 0.5;
        let level = Level::new(&config, 5).unwrap();
        let mut day = DaySimulation::new(level);
        match day.run(&StopHandle::new()) {
            DayResult::Completed(outcome) => {
                assert!(outcome.success);
                assert_eq!(outcome.ticks_elapsed, 1800);
                assert_eq!(
                    outcome.door_stats.successes + outcome.door_stats.failures,
                    outcome.attacker_successes + outcome.attacker_failures
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_normal_day_ends_at_first_attempt() {
        let mut config = config();
        config.attacker.strategy = Strategy::Normal;
        config.guards.number_of_guards = 0;
        let level = Level::new(&config, 6).unwrap();
        let mut day = DaySimulation::new(level);
        let DayResult::Completed(outcome) = day.run(&StopHandle::new()) else {
            panic!("day aborted");
        };
        assert!(outcome.ticks_elapsed < 8 * 3600);
        assert_eq!(day.level().attacker().attempts(), 1);
        assert_eq!((outcome.attacker_successes, outcome.attacker_failures), (0, 0));
    }

    #[test]
    fn test_stop_before_start_aborts() {
        let level = Level::new(&config(), 7).unwrap();
        let mut day = DaySimulation::new(level);
        let stop = StopHandle::new();
        stop.request_stop();
        assert_eq!(day.run(&stop), DayResult::Aborted { ticks: 0 });
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let stop = StopHandle::new();
        let other = stop.clone();
        assert!(!stop.is_stopped());
        other.request_stop();
        assert!(stop.is_stopped());
    }
}
