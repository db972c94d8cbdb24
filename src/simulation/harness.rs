//! Monte Carlo harness: repeats day simulations and aggregates their outcomes
//!
//! Trial `i` of a run always uses `trial_seed(seed, i)`, so a sequential run
//! and a rayon-parallel run of the same seed record identical trials. Parallel
//! results are merged in trial order; the first aborted trial ends the run and
//! nothing after it is counted.

use rayon::prelude::*;

use crate::core::config::{GameConfig, TestType};
use crate::core::error::Result;
use crate::core::random::trial_seed;
use crate::simulation::day::{DayResult, DaySimulation, StopHandle};
use crate::simulation::level::Level;
use crate::simulation::statistics::GameStatistics;

/// Statistics of a finished (or interrupted) run
#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub statistics: GameStatistics,
    /// Master seed the run was started with
    pub seed: u64,
    /// True when a stop request cut the run short
    pub interrupted: bool,
}

pub struct Harness {
    config: GameConfig,
    iterations: u32,
    batches: u32,
    seed: u64,
    parallel: bool,
    stop: StopHandle,
}

impl Harness {
    /// Harness for `config`, using its iterations, batches and seed
    ///
    /// Without a configured seed a random master seed is drawn.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            iterations: config.iterations,
            batches: config.batches.max(1),
            seed: config.seed.unwrap_or_else(rand::random),
            parallel: false,
            stop: StopHandle::new(),
            config,
        })
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_batches(mut self, batches: u32) -> Self {
        self.batches = batches.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_stop(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn batches(&self) -> u32 {
        self.batches
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run one trial of this harness in isolation
    pub fn run_trial(&self, index: u64) -> Result<DayResult> {
        let level = Level::new(&self.config, trial_seed(self.seed, index))?;
        Ok(DaySimulation::new(level).run(&self.stop))
    }

    pub fn run(&self) -> Result<HarnessReport> {
        let site = self.config.site();
        let mut statistics = GameStatistics::new(self.config.test_type, site.day_ticks);
        let mut interrupted = false;

        tracing::info!(
            "Running {} x {} trials of {} (seed {}, {})",
            self.batches,
            self.iterations,
            self.config.name(),
            self.seed,
            if self.parallel { "parallel" } else { "sequential" }
        );

        for batch in 0..self.batches {
            let first = u64::from(batch) * u64::from(self.iterations);
            let indices = first..first + u64::from(self.iterations);

            let results: Vec<Result<DayResult>> = if self.parallel {
                indices
                    .collect::<Vec<_>>()
                    .into_par_iter()
                    .map(|index| self.run_trial(index))
                    .collect()
            } else {
                let mut results = Vec::with_capacity(self.iterations as usize);
                for index in indices {
                    let result = self.run_trial(index);
                    let aborted = matches!(result, Ok(DayResult::Aborted { .. }));
                    results.push(result);
                    if aborted {
                        break;
                    }
                }
                results
            };

            if fold_batch(&mut statistics, first, results)? {
                interrupted = true;
                break;
            }

            if let Some(summary) = statistics.finish_batch() {
                tracing::info!(
                    "Batch {}: {} wins, {} losses, doors entered {} blocked {}, p={:.4} q={:.4}",
                    batch,
                    summary.wins,
                    summary.losses,
                    summary.door_stats.successes,
                    summary.door_stats.failures,
                    summary.p_value(),
                    summary.q_value(site.day_ticks)
                );
            }
        }

        tracing::info!(
            "{} trials done: attacker won {} and lost {}, p={:.6} q={:.6}",
            statistics.completed_trials(),
            statistics.wins(),
            statistics.losses(),
            statistics.p_value(),
            statistics.q_value()
        );

        Ok(HarnessReport {
            statistics,
            seed: self.seed,
            interrupted,
        })
    }
}

/// Fold the results of one batch into `statistics` in trial order
///
/// Returns true when an aborted trial ends the run. That trial and every later
/// result are dropped, and the trials completed before it are kept as a
/// closed partial batch.
fn fold_batch(
    statistics: &mut GameStatistics,
    first: u64,
    results: Vec<Result<DayResult>>,
) -> Result<bool> {
    let estimate = match statistics.test_type() {
        TestType::PTest => "p",
        TestType::QTest => "q",
    };

    for (offset, result) in results.into_iter().enumerate() {
        match result? {
            DayResult::Completed(outcome) => {
                statistics.record(&outcome);
                tracing::info!(
                    "Trial {} has {}={:.4}",
                    first + offset as u64,
                    estimate,
                    statistics.estimate()
                );
            }
            DayResult::Aborted { ticks } => {
                tracing::warn!(
                    "Trial {} stopped after {} ticks, discarding it",
                    first + offset as u64,
                    ticks
                );
                statistics.finish_batch();
                return Ok(true);
            }
        }
    }
    Ok(false)
}
