//! prefixlist: drive prefix list scenarios against the simulated control plane.
//!
//! Usage:
//!   prefixlist run scenarios/demo.yaml
//!   prefixlist run scenarios/demo.yaml --time-scale 0 --page-size 2
//!   prefixlist run scenarios/demo.yaml --poll-delay-seconds 1 --max-pages 10
//!
//! Reads optional overrides from env vars (a `.env` file is honoured):
//!   PREFIXLIST_POLL_DELAY_SECONDS - delay requested between polls (default: 5)
//!   PREFIXLIST_MAX_PAGES          - page cap for paginated listings (default: 1000)
//!   RUST_LOG                      - log filter (default: info,prefixlist_core=debug)

mod driver;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use prefixlist_core::{InMemoryRemoteStore, PrefixListHandlers, ReconcilerConfig, SimulationSettings};

use crate::driver::{DriverOptions, ScenarioDriver};
use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "prefixlist")]
#[command(about = "Drive prefix list reconciliation scenarios against a simulated control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scenario file and print one JSON report per step
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Scenario YAML file
    scenario: PathBuf,

    /// Describes that still report in-progress after each mutation
    #[arg(long, env = "PREFIXLIST_SETTLE_AFTER_POLLS", default_value_t = 1)]
    settle_after_polls: u32,

    /// Items per page returned by the simulated listings
    #[arg(long, env = "PREFIXLIST_PAGE_SIZE", default_value_t = 100)]
    page_size: usize,

    /// Multiplier for requested delays (0 = don't sleep)
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Invocations allowed per step
    #[arg(long, default_value_t = 50)]
    max_invocations: usize,

    /// Delay requested between polls, overriding PREFIXLIST_POLL_DELAY_SECONDS
    #[arg(long)]
    poll_delay_seconds: Option<u32>,

    /// Page cap for paginated listings, overriding PREFIXLIST_MAX_PAGES
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_pages: Option<usize>,

    /// Owner account of simulated lists
    #[arg(long, env = "PREFIXLIST_OWNER_ID", default_value = "123456789012")]
    owner_id: String,

    /// Region used in simulated ARNs
    #[arg(long, env = "PREFIXLIST_REGION", default_value = "us-east-1")]
    region: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prefixlist_core=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    let scenario = Scenario::load(&args.scenario)?;

    let store = InMemoryRemoteStore::with_settings(SimulationSettings {
        settle_after_polls: args.settle_after_polls,
        page_size: args.page_size,
        owner_id: args.owner_id.clone(),
        region: args.region.clone(),
    });
    let config = reconciler_config(ReconcilerConfig::from_env(), &args);
    tracing::info!(
        poll_delay_seconds = config.poll_delay_seconds,
        max_pages = config.max_pages,
        "Reconciler configured"
    );
    let handlers = PrefixListHandlers::new(Arc::new(store), config);

    let mut driver = ScenarioDriver::new(
        handlers,
        DriverOptions {
            time_scale: args.time_scale,
            max_invocations: args.max_invocations,
        },
    );
    let reports = driver.run(&scenario).await;

    let json = serde_json::to_string_pretty(&reports).context("serializing step reports")?;
    println!("{}", json);

    let completed = reports.len() == scenario.steps.len() && reports.iter().all(|r| r.is_done());
    Ok(if completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Command-line flags win over the environment.
fn reconciler_config(base: ReconcilerConfig, args: &RunArgs) -> ReconcilerConfig {
    let mut config = base;
    if let Some(seconds) = args.poll_delay_seconds {
        config = config.with_poll_delay_seconds(seconds);
    }
    if let Some(max_pages) = args.max_pages {
        config = config.with_max_pages(max_pages);
    }
    config
}
