//! Intrusion Game - tick-driven physical intrusion simulation with Monte Carlo statistics

pub mod core;
pub mod entity;
pub mod simulation;
