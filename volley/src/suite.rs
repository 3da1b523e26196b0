//! Suite of repeated benchmarks
use crate::error::SuiteError;
use crate::measurement::Measurement;
use crate::runner::{Outcome, ParallelRunner, Runner, SequentialRunner};
use crate::transaction::{transaction_hook, TransactionLabels};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use volley_core::{RunStatistics, SuiteConfig, MAX_REPORTED_ERRORS};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type BoxedTask =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>> + Send + Sync>;

/// A named task together with the number of times it should run.
#[derive(Clone)]
pub struct Benchmark {
    name: String,
    number: usize,
    fun: BoxedTask,
}

impl Benchmark {
    /// Register `fun` to be executed `number` times.
    ///
    /// # Example
    /// ```no_run
    /// use volley::prelude::*;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let mut suite = Suite::new(SuiteConfig::new());
    ///     suite.add(Benchmark::new("noop", 500, || async { Ok::<_, std::io::Error>(()) }));
    ///     suite.run().await;
    /// }
    /// ```
    pub fn new<T, F, E>(name: &str, number: usize, fun: T) -> Self
    where
        T: Fn() -> F + Send + Sync + 'static,
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let fun: BoxedTask = Arc::new(move || {
            let fut = fun();
            Box::pin(async move { fut.await.map_err(Into::into) })
                as Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>
        });

        Self {
            name: name.to_string(),
            number,
            fun,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Run every iteration under `config` and summarize the outcomes.
    #[instrument(name = "benchmark", skip_all, fields(name = self.name))]
    pub async fn run(&self, config: &SuiteConfig) -> Report {
        info!(
            "Running {} x{} with config {:?}",
            self.name, self.number, config
        );

        let labels = Arc::new(TransactionLabels::new(&self.name));
        let fun = self.fun.clone();
        let task = move || {
            let fut = (*fun)();
            let labels = labels.clone();
            async move { transaction_hook(&labels, fut).await }
        };

        let mut measurement = Measurement::new();
        let mut errors = vec![];
        let sink = |outcome: Outcome<BoxError>| {
            measurement.record(outcome.elapsed, outcome.is_ok());
            if let Err(err) = outcome.result {
                warn!(iteration = outcome.index, "Iteration failed: {err}");
                if errors.len() < MAX_REPORTED_ERRORS {
                    errors.push(err.to_string());
                }
            }
        };

        let start = Instant::now();
        if config.parallel {
            ParallelRunner::new(config.concurrency)
                .with_tps_limit(config.tps_limit)
                .run(task, self.number, sink)
                .await;
        } else {
            SequentialRunner::new()
                .with_tps_limit(config.tps_limit)
                .run(task, self.number, sink)
                .await;
        }
        let elapsed = start.elapsed();

        let stats = measurement.into_statistics(&self.name, self.number, elapsed);
        if stats.completed() < self.number as u64 {
            error!(
                "Only {} of {} iterations reported an outcome",
                stats.completed(),
                self.number
            );
        }
        info!("{stats}");

        Report { stats, errors }
    }
}

impl fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("number", &self.number)
            .finish_non_exhaustive()
    }
}

/// Outcome summary of one benchmark.
#[derive(Debug, Clone)]
pub struct Report {
    pub stats: RunStatistics,
    /// Rendered messages of the first failures, in iteration order.
    pub errors: Vec<String>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0 && self.stats.completed() == self.stats.repetitions as u64
    }

    /// Turn a report with failed iterations into an error.
    pub fn ensure_success(self) -> Result<RunStatistics, SuiteError> {
        if self.is_success() {
            return Ok(self.stats);
        }

        let missing = (self.stats.repetitions as u64).saturating_sub(self.stats.completed());
        let first = self
            .errors
            .into_iter()
            .next()
            .unwrap_or_else(|| "iteration produced no outcome".to_string());

        Err(SuiteError::IterationsFailed {
            name: self.stats.name,
            repetitions: self.stats.repetitions,
            failed: self.stats.failed + missing,
            first,
        })
    }
}

/// An ordered collection of benchmarks sharing one [`SuiteConfig`].
#[derive(Debug, Clone, Default)]
pub struct Suite {
    config: SuiteConfig,
    benchmarks: Vec<Benchmark>,
}

impl Suite {
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            benchmarks: vec![],
        }
    }

    pub fn add(&mut self, benchmark: Benchmark) -> &mut Self {
        self.benchmarks.push(benchmark);
        self
    }

    /// Run the benchmarks in registration order.
    #[instrument(name = "suite", skip_all)]
    pub async fn run(&self) -> Vec<Report> {
        let mut reports = Vec::with_capacity(self.benchmarks.len());
        for benchmark in &self.benchmarks {
            reports.push(benchmark.run(&self.config).await);
        }
        reports
    }
}
