use super::stats::LatencyStats;
use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const RULE_WIDTH: usize = 80;

/// Result of one trial
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Measured(Duration),
    /// The trial completed but produced no measurement
    Empty,
    Failed(ClientError),
}

/// Runs latency trials one after another with a pause in between
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    pub runs: usize,
    pub pause: Duration,
}

impl BenchmarkRunner {
    pub fn new(runs: usize, pause: Duration) -> Self {
        Self { runs, pause }
    }

    /// Run `trial` up to `runs` times, stopping early when `shutdown` resolves
    ///
    /// `Ok(Some(d))` is a success, `Ok(None)` or `Err` a failure. Trials
    /// never overlap.
    pub async fn run<F, Fut, S>(&self, mut trial: F, shutdown: S) -> BenchmarkReport
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = ClientResult<Option<Duration>>>,
        S: Future<Output = ()>,
    {
        let mut report = BenchmarkReport::new();
        tokio::pin!(shutdown);

        for run in 0..self.runs {
            let outcome = tokio::select! {
                _ = &mut shutdown => {
                    info!("Benchmark interrupted after {} runs", run);
                    report.interrupted = true;
                    break;
                }
                result = trial(run) => match result {
                    Ok(Some(latency)) => TrialOutcome::Measured(latency),
                    Ok(None) => TrialOutcome::Empty,
                    Err(e) => TrialOutcome::Failed(e),
                },
            };

            match &outcome {
                TrialOutcome::Measured(latency) => info!(
                    "Run {}/{}: {:.2}ms",
                    run + 1,
                    self.runs,
                    latency.as_secs_f64() * 1000.0
                ),
                TrialOutcome::Empty => warn!("Run {}/{}: no measurement recorded", run + 1, self.runs),
                TrialOutcome::Failed(e) => warn!("Run {}/{}: {}", run + 1, self.runs, e),
            }
            report.record(outcome);

            if run + 1 < self.runs && !self.pause.is_zero() {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Benchmark interrupted after {} runs", run + 1);
                        report.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.pause) => {}
                }
            }
        }

        report.stats = LatencyStats::from_samples(&report.samples_ms);
        report
    }
}

/// Aggregated benchmark results
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
    /// Successful measurements in run order
    pub samples_ms: Vec<f64>,
    pub stats: LatencyStats,
    pub interrupted: bool,
    pub finished_at: DateTime<Local>,
    /// Free-form header lines (host, speaker, text)
    pub details: Vec<(String, String)>,
}

impl BenchmarkReport {
    fn new() -> Self {
        Self {
            attempts: 0,
            successes: 0,
            failures: 0,
            samples_ms: Vec::new(),
            stats: LatencyStats::default(),
            interrupted: false,
            finished_at: Local::now(),
            details: Vec::new(),
        }
    }

    fn record(&mut self, outcome: TrialOutcome) {
        self.attempts += 1;
        self.finished_at = Local::now();
        match outcome {
            TrialOutcome::Measured(latency) => {
                self.successes += 1;
                self.samples_ms.push(latency.as_secs_f64() * 1000.0);
            }
            TrialOutcome::Empty | TrialOutcome::Failed(_) => self.failures += 1,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn has_samples(&self) -> bool {
        !self.samples_ms.is_empty()
    }

    /// Summary table as printed to the terminal
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(RULE_WIDTH);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Benchmark Results");
        let _ = writeln!(out, "{}", rule);
        self.write_summary(&mut out);
        let _ = write!(out, "{}", rule);
        out
    }

    /// Save the summary plus raw measurements to
    /// `ttft_benchmark_results_<unix>.txt` inside `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> ClientResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "ttft_benchmark_results_{}.txt",
            self.finished_at.timestamp()
        ));

        let mut out = String::new();
        let _ = writeln!(out, "Talkscriber TTS - TTFT Benchmark Results");
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(
            out,
            "Timestamp: {}",
            self.finished_at.format("%Y-%m-%d %H:%M:%S")
        );
        for (key, value) in &self.details {
            let _ = writeln!(out, "{}: {}", key, value);
        }
        let _ = writeln!(out);
        self.write_summary(&mut out);
        let _ = writeln!(out);
        let _ = writeln!(out, "Raw measurements (ms):");
        for (idx, sample) in self.samples_ms.iter().enumerate() {
            let _ = writeln!(out, "  Run {:3}: {:.2}", idx + 1, sample);
        }

        std::fs::write(&path, out)?;
        info!("Benchmark results saved to {}", path.display());
        Ok(path)
    }

    fn write_summary(&self, out: &mut String) {
        let _ = writeln!(out, "Total runs: {}", self.attempts);
        let _ = writeln!(out, "Successful: {}", self.successes);
        let _ = writeln!(out, "Failed: {}", self.failures);
        if self.interrupted {
            let _ = writeln!(out, "Interrupted: yes");
        }
        let _ = writeln!(out);

        if !self.has_samples() {
            let _ = writeln!(out, "No successful measurements collected");
            return;
        }

        let s = &self.stats;
        let _ = writeln!(out, "TTFT Latency Statistics (milliseconds):");
        let _ = writeln!(out, "  Min:       {:8.2} ms", s.min);
        let _ = writeln!(out, "  Max:       {:8.2} ms", s.max);
        let _ = writeln!(out, "  Mean:      {:8.2} ms", s.mean);
        let _ = writeln!(out, "  Median:    {:8.2} ms", s.median);
        let _ = writeln!(out, "  Std Dev:   {:8.2} ms", s.stdev);
        let _ = writeln!(out);
        let _ = writeln!(out, "Percentiles:");
        let _ = writeln!(out, "  P50:       {:8.2} ms", s.p50);
        let _ = writeln!(out, "  P95:       {:8.2} ms", s.p95);
        let _ = writeln!(out, "  P99:       {:8.2} ms", s.p99);
    }
}
