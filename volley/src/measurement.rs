use pdatastructs::tdigest::{TDigest, K1};
use std::time::Duration;
use tracing::error;
use volley_core::RunStatistics;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Aggregates per-iteration outcomes into a [`RunStatistics`].
#[derive(Debug, Clone)]
pub(crate) struct Measurement {
    succeeded: u64,
    failed: u64,
    total_latency: Duration,
    min: Option<Duration>,
    max: Option<Duration>,
    latency: TDigest<K1>,
}

impl Measurement {
    pub fn new() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            total_latency: Duration::ZERO,
            min: None,
            max: None,
            latency: default_tdigest(),
        }
    }

    pub fn record(&mut self, latency: Duration, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        self.total_latency += latency;
        self.min = Some(self.min.map_or(latency, |min| min.min(latency)));
        self.max = Some(self.max.map_or(latency, |max| max.max(latency)));
        self.latency.insert(latency.as_secs_f64());
    }

    pub fn count(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn mean(&self) -> Duration {
        match self.count() {
            0 => Duration::ZERO,
            n => Duration::from_nanos((self.total_latency.as_nanos() / n as u128) as u64),
        }
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        if self.count() == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);

        // TDigest occasionally yields NaN on tiny sample sets.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Non-finite latency estimate for quantile {quantile}.");
            0.
        };

        Duration::from_secs_f64(secs)
    }

    pub fn into_statistics(self, name: &str, repetitions: usize, elapsed: Duration) -> RunStatistics {
        let throughput = if elapsed.is_zero() {
            0.
        } else {
            self.count() as f64 / elapsed.as_secs_f64()
        };

        RunStatistics {
            name: name.to_string(),
            repetitions,
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed,
            throughput,
            latency_mean: self.mean(),
            latency_min: self.min.unwrap_or_default(),
            latency_max: self.max.unwrap_or_default(),
            latency_p50: self.latency(0.5),
            latency_p90: self.latency(0.9),
            latency_p99: self.latency(0.99),
        }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
