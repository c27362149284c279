use clap::Parser;
use std::path::PathBuf;

mod auth;
mod catalog;
mod chat;
mod client;
mod compare;
mod config;
mod meta_eval;
mod mock;
mod models;
mod output;
mod phases;
mod report;
mod reveal;
mod runner;
mod storage;

use crate::config::SessionConfig;
use crate::output::OutputFormat;
use crate::runner::SessionRunner;

/// CoreEval demo driver - run a scripted model-comparison session and print
/// the per-phase results and final report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML session file
    run_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - show progress for each phase step
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = SessionConfig::from_file(&args.run_file)?;
    let mut runner = SessionRunner::new(config)?;

    let session = runner.run().await?;

    output::print_session(&session, args.output);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "coreeval=debug" } else { "coreeval=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
