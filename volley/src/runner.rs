//! Execution strategies for repeating a task a fixed number of times.
mod parallel;
mod sequential;

pub use parallel::ParallelRunner;
pub use sequential::SequentialRunner;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

/// Result of a single iteration.
#[derive(Debug)]
pub struct Outcome<E> {
    /// Zero-based position of the iteration within the run.
    pub index: usize,
    pub elapsed: Duration,
    pub result: Result<(), E>,
}

impl<E> Outcome<E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executes a task `repetitions` times and hands one [`Outcome`] per attempted iteration to
/// `sink` as soon as it completes.
///
/// Every iteration is attempted regardless of earlier failures. Outcomes are not buffered, so
/// memory use does not depend on `repetitions`. Dropping the returned future stops the run:
/// no new iterations are started and in-flight ones are cancelled. The future resolves to the
/// number of outcomes delivered.
pub trait Runner: Send + Sync {
    fn run<T, F, E, S>(
        &self,
        task: T,
        repetitions: usize,
        sink: S,
    ) -> impl Future<Output = usize> + Send
    where
        T: Fn() -> F + Send + Sync + Clone + 'static,
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
        S: FnMut(Outcome<E>) + Send;
}

pub(crate) fn rate_limiter(tps_limit: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps_limit).allow_burst(NonZeroU32::MIN))
}
