use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Summary of a single benchmark run.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub name: String,
    pub repetitions: usize,
    pub succeeded: u64,
    pub failed: u64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    /// Completed iterations per second of wall time.
    pub throughput: f64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_mean: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_min: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_max: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p99: Duration,
}

impl RunStatistics {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn error_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.,
            n => self.failed as f64 / n as f64,
        }
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} ok in {} ({:.2} it/s, {:.2}% errors), mean={}, min={}, max={}, p50={}, p90={}, p99={}",
            self.name,
            self.succeeded,
            self.repetitions,
            humantime::format_duration(self.elapsed),
            self.throughput,
            self.error_rate() * 100.,
            humantime::format_duration(self.latency_mean),
            humantime::format_duration(self.latency_min),
            humantime::format_duration(self.latency_max),
            humantime::format_duration(self.latency_p50),
            humantime::format_duration(self.latency_p90),
            humantime::format_duration(self.latency_p99),
        )
    }
}
