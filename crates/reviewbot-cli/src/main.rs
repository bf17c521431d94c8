//! Binary entrypoint: loads configuration, starts the scheduler actor and
//! the operator console server, and shuts both down gracefully on Ctrl-C.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod rule_engine;

use clap::Parser;
use reviewbot_scheduler::Scheduler;
use rule_engine::NoOpRuleEngine;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Continuously crawl the package registry, flag unused dependencies, and
/// open corrected pull requests.
#[derive(Debug, Parser)]
#[command(name = "reviewbot", version)]
struct Cli {
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Suppress all but error-level logs.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create runtime");

    match runtime.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "reviewbot exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = reviewbot_config::Config::from_env()?;

    let (deltas_tx, _deltas_rx) = broadcast::channel(1024);
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    let scheduler = Scheduler::new(&config, Arc::new(NoOpRuleEngine), deltas_tx.clone());

    let scheduler_task = tokio::spawn(scheduler.run(commands_rx, shutdown_signal()));
    let broadcaster_task = tokio::spawn({
        let deltas_tx = deltas_tx.clone();
        async move { reviewbot_broadcaster::serve(&config, deltas_tx, commands_tx, shutdown_signal()).await }
    });

    info!("reviewbot started");

    let (scheduler_result, broadcaster_result) = tokio::join!(scheduler_task, broadcaster_task);
    scheduler_result?;
    broadcaster_result??;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
