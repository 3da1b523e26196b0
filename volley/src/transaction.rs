use std::future::Future;
use std::time::Instant;

/// Metric names recorded for every iteration of a benchmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionLabels {
    pub success: String,
    pub error: String,
    pub latency: String,
}

impl TransactionLabels {
    pub fn new(name: &str) -> Self {
        Self {
            success: format!("volley.{name}.success"),
            error: format!("volley.{name}.error"),
            latency: format!("volley.{name}.latency"),
        }
    }
}

/// Wraps one iteration, recording its latency and result through the `metrics` facade.
pub async fn transaction_hook<F, E>(labels: &TransactionLabels, func: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
{
    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    {
        metrics::histogram!(labels.latency.clone()).record(elapsed.as_nanos() as f64);
        if res.is_ok() {
            metrics::counter!(labels.success.clone()).increment(1);
        } else {
            metrics::counter!(labels.error.clone()).increment(1);
        }
    }

    #[cfg(not(feature = "metrics"))]
    let _ = (labels, elapsed);

    res
}
