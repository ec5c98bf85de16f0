//! Sequential latency sampling with percentile statistics

mod runner;
mod stats;

pub use runner::{BenchmarkReport, BenchmarkRunner, TrialOutcome};
pub use stats::{percentile, LatencyStats};
