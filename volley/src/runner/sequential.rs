use super::{rate_limiter, Outcome, Runner};
use std::future::Future;
use std::num::NonZeroU32;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Awaits each iteration before starting the next.
#[derive(Debug, Clone, Default)]
pub struct SequentialRunner {
    tps_limit: Option<NonZeroU32>,
}

impl SequentialRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tps_limit(mut self, tps_limit: Option<NonZeroU32>) -> Self {
        self.tps_limit = tps_limit;
        self
    }
}

impl Runner for SequentialRunner {
    fn run<T, F, E, S>(
        &self,
        task: T,
        repetitions: usize,
        mut sink: S,
    ) -> impl Future<Output = usize> + Send
    where
        T: Fn() -> F + Send + Sync + Clone + 'static,
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
        S: FnMut(Outcome<E>) + Send,
    {
        let limiter = self.tps_limit.map(rate_limiter);
        async move {
            debug!("Running {repetitions} iterations sequentially");
            for index in 0..repetitions {
                if let Some(limiter) = &limiter {
                    limiter.until_ready().await;
                }

                let start = Instant::now();
                let result = task().await;
                trace!(index, "Iteration complete");
                sink(Outcome {
                    index,
                    elapsed: start.elapsed(),
                    result,
                });
            }
            repetitions
        }
    }
}
