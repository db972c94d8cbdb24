//! Trial composition, the day loop and the Monte Carlo statistics layer

pub mod day;
pub mod harness;
pub mod level;
pub mod output;
pub mod statistics;
pub mod ztest;

pub use day::{DayResult, DaySimulation, StopHandle, TrialOutcome};
pub use harness::{Harness, HarnessReport};
pub use level::Level;
pub use output::RunRecord;
pub use statistics::{BatchStats, GameStatistics};
pub use ztest::{z_test, SampleMethod, ZTestReport};
