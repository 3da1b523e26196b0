use super::{rate_limiter, Outcome, Runner};
use std::future::Future;
use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, trace};
use volley_core::DEFAULT_CONCURRENCY;

/// Runs iterations on a bounded pool of tokio tasks.
///
/// Workers claim iteration indices from a shared counter, so at most `concurrency` iterations
/// are in flight at any time and exactly `repetitions` are started. Workers live in a
/// [`JoinSet`] owned by the run future and are aborted if it is dropped.
#[derive(Debug, Clone)]
pub struct ParallelRunner {
    concurrency: NonZeroUsize,
    tps_limit: Option<NonZeroU32>,
}

impl ParallelRunner {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            tps_limit: None,
        }
    }

    pub fn with_tps_limit(mut self, tps_limit: Option<NonZeroU32>) -> Self {
        self.tps_limit = tps_limit;
        self
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl Runner for ParallelRunner {
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
        let workers = self.concurrency.get().min(repetitions);
        let limiter = self.tps_limit.map(|tps| Arc::new(rate_limiter(tps)));

        async move {
            if workers == 0 {
                return 0;
            }

            debug!("Running {repetitions} iterations on {workers} workers");
            let next = Arc::new(AtomicUsize::new(0));
            let (tx, mut rx) = mpsc::channel(workers);

            let mut set = JoinSet::new();
            for worker in 0..workers {
                let task = task.clone();
                let next = next.clone();
                let limiter = limiter.clone();
                let tx = tx.clone();
                set.spawn(async move {
                    let mut count = 0usize;
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= repetitions {
                            break;
                        }

                        if let Some(limiter) = &limiter {
                            limiter.until_ready().await;
                        }

                        let start = Instant::now();
                        let result = task().await;
                        let outcome = Outcome {
                            index,
                            elapsed: start.elapsed(),
                            result,
                        };
                        if tx.send(outcome).await.is_err() {
                            break;
                        }
                        count += 1;
                    }
                    trace!(worker, count, "Worker finished");
                });
            }
            // NOTE: The receiver closes once every worker has dropped its sender.
            drop(tx);

            let mut delivered = 0;
            while let Some(outcome) = rx.recv().await {
                sink(outcome);
                delivered += 1;
            }

            while let Some(res) = set.join_next().await {
                if let Err(err) = res {
                    error!("Worker task did not complete: {err}");
                }
            }
            delivered
        }
    }
}
