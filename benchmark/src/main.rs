use anyhow::{Context, Result};
use clap::Parser;
use std::num::{NonZeroU32, NonZeroUsize};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use volley::core::{DEFAULT_CONCURRENCY, DEFAULT_REPETITIONS, DEFAULT_TARGET_URL};
use volley::prelude::*;

/// Hammer the captcha service's `/request` endpoint with identical form posts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(long, default_value = DEFAULT_TARGET_URL)]
    url: String,

    #[arg(short = 'n', long, default_value_t = DEFAULT_REPETITIONS)]
    repetitions: usize,

    /// Await each request before sending the next.
    #[arg(long)]
    sequential: bool,

    /// Maximum in-flight requests when running in parallel.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: NonZeroUsize,

    /// Cap on requests started per second.
    #[arg(long)]
    tps: Option<NonZeroU32>,

    /// Print the run statistics as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn suite_config(&self) -> SuiteConfig {
        let config = SuiteConfig::new()
            .parallel(!self.sequential)
            .concurrency(self.concurrency);
        match self.tps {
            Some(tps) => config.tps_limit(tps),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("volley=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let generator = LoadGenerator::new(&cli.url).context("cannot build load generator")?;

    info!("Sending {} requests to {}", cli.repetitions, generator.url());
    let report = generator
        .run_with(cli.suite_config(), cli.repetitions)
        .await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.stats)?);
    }

    report.ensure_success()?;
    Ok(())
}
