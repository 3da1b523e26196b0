#![doc = include_str!("../README.md")]

pub mod error;
pub mod load;
pub mod runner;
pub mod suite;
#[doc(hidden)]
pub mod transaction;

pub(crate) mod measurement;

pub use error::{IterationError, SuiteError};
pub use load::{LoadGenerator, RequestDescriptor};
pub use suite::{Benchmark, Report, Suite};
pub use volley_core as core;

pub mod prelude {
    pub use crate::load::{LoadGenerator, RequestDescriptor};
    pub use crate::runner::{Outcome, ParallelRunner, Runner, SequentialRunner};
    pub use crate::suite::{Benchmark, Report, Suite};

    pub use volley_core::{RunStatistics, SuiteConfig};
}
