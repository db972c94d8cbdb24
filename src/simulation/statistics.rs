//! Aggregate statistics over completed trials
//!
//! Everything is accumulated as integer sums, so the p and q estimates do not
//! depend on the order trials are recorded in.

use serde::Serialize;

use crate::core::config::TestType;
use crate::core::types::{ticks_to_minutes, Tick};
use crate::entity::DoorStats;
use crate::simulation::day::TrialOutcome;

/// Counters of one batch of trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub trials: u32,
    pub wins: u32,
    pub losses: u32,
    pub successes: u64,
    pub failures: u64,
    pub total_ticks: Tick,
    pub door_stats: DoorStats,
}

impl BatchStats {
    fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        if outcome.success {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.successes += u64::from(outcome.attacker_successes);
        self.failures += u64::from(outcome.attacker_failures);
        self.total_ticks += outcome.ticks_elapsed;
        self.door_stats += outcome.door_stats;
    }

    pub fn p_value(&self) -> f64 {
        ratio(self.successes, self.successes + self.failures)
    }

    pub fn q_value(&self, day_ticks: Tick) -> f64 {
        ratio(self.total_ticks, u64::from(self.trials) * day_ticks)
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Running statistics of a whole harness run
#[derive(Debug, Clone)]
pub struct GameStatistics {
    test_type: TestType,
    day_ticks: Tick,
    totals: BatchStats,
    win_ticks: Tick,
    loss_ticks: Tick,
    captures: u64,
    /// Running p after each trial
    p_samples: Vec<f64>,
    /// Normalized elapsed time of each trial
    q_samples: Vec<f64>,
    current: BatchStats,
    batches: Vec<BatchStats>,
}

impl GameStatistics {
    pub fn new(test_type: TestType, day_ticks: Tick) -> Self {
        Self {
            test_type,
            day_ticks,
            totals: BatchStats::default(),
            win_ticks: 0,
            loss_ticks: 0,
            captures: 0,
            p_samples: Vec::new(),
            q_samples: Vec::new(),
            current: BatchStats::default(),
            batches: Vec::new(),
        }
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    pub fn day_ticks(&self) -> Tick {
        self.day_ticks
    }

    /// Fold one completed trial into the running totals
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.totals.record(outcome);
        self.current.record(outcome);
        if outcome.success {
            self.win_ticks += outcome.ticks_elapsed;
        } else {
            self.loss_ticks += outcome.ticks_elapsed;
        }
        self.captures += u64::from(outcome.captures);

        self.p_samples.push(self.p_value());
        self.q_samples.push(ratio(outcome.ticks_elapsed, self.day_ticks));
    }

    /// Close the current batch; empty batches are not kept
    pub fn finish_batch(&mut self) -> Option<BatchStats> {
        if self.current.trials == 0 {
            return None;
        }
        let batch = std::mem::take(&mut self.current);
        self.batches.push(batch);
        Some(batch)
    }

    pub fn completed_trials(&self) -> u32 {
        self.totals.trials
    }

    pub fn wins(&self) -> u32 {
        self.totals.wins
    }

    pub fn losses(&self) -> u32 {
        self.totals.losses
    }

    pub fn successes(&self) -> u64 {
        self.totals.successes
    }

    pub fn failures(&self) -> u64 {
        self.totals.failures
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn door_stats(&self) -> DoorStats {
        self.totals.door_stats
    }

    pub fn batches(&self) -> &[BatchStats] {
        &self.batches
    }

    /// Attacker success rate per attempt, 0 without attempts
    pub fn p_value(&self) -> f64 {
        self.totals.p_value()
    }

    /// Mean fraction of the day elapsed per trial, 0 without trials
    pub fn q_value(&self) -> f64 {
        self.totals.q_value(self.day_ticks)
    }

    /// Minutes spent in won trials, averaged over every completed trial
    pub fn avg_win_time(&self) -> f64 {
        self.per_trial_minutes(self.win_ticks)
    }

    /// Minutes spent in lost trials, averaged over every completed trial
    pub fn avg_loss_time(&self) -> f64 {
        self.per_trial_minutes(self.loss_ticks)
    }

    fn per_trial_minutes(&self, ticks: Tick) -> f64 {
        if self.totals.trials == 0 {
            0.0
        } else {
            ticks_to_minutes(ticks) / f64::from(self.totals.trials)
        }
    }

    pub fn p_samples(&self) -> &[f64] {
        &self.p_samples
    }

    pub fn q_samples(&self) -> &[f64] {
        &self.q_samples
    }

    /// Per-trial samples of the estimator the run is testing
    pub fn samples(&self) -> &[f64] {
        match self.test_type {
            TestType::PTest => &self.p_samples,
            TestType::QTest => &self.q_samples,
        }
    }

    /// Samples fed to the Z-test: per-batch estimates when more than one batch
    /// was closed, per-trial samples otherwise
    pub fn test_samples(&self) -> Vec<f64> {
        if self.batches.len() > 1 {
            self.batches
                .iter()
                .map(|b| match self.test_type {
                    TestType::PTest => b.p_value(),
                    TestType::QTest => b.q_value(self.day_ticks),
                })
                .collect()
        } else {
            self.samples().to_vec()
        }
    }

    /// Estimate the run is about
    pub fn estimate(&self) -> f64 {
        match self.test_type {
            TestType::PTest => self.p_value(),
            TestType::QTest => self.q_value(),
        }
    }
}
