use crate::DEFAULT_CONCURRENCY;
use std::num::{NonZeroU32, NonZeroUsize};

/// Execution options shared by every benchmark in a suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Whether iterations may overlap.
    pub parallel: bool,
    /// Maximum in-flight iterations when `parallel` is set.
    pub concurrency: NonZeroUsize,
    /// Optional cap on iteration starts per second.
    pub tps_limit: Option<NonZeroU32>,
}

impl SuiteConfig {
    pub fn new() -> Self {
        Self {
            parallel: true,
            concurrency: DEFAULT_CONCURRENCY,
            tps_limit: None,
        }
    }

    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::new()
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn tps_limit(mut self, tps_limit: NonZeroU32) -> Self {
        self.tps_limit = Some(tps_limit);
        self
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::new()
    }
}
