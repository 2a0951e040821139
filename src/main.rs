//! Main entry point for the ryt-js CLI

use anyhow::Context;
use clap::Parser;
use ryt_js::cli::{self, Args, VerbosityLevel};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.verbosity_level())?;
    debug!("Starting ryt-js with args: {:?}", args);

    let result = cli::run(&args)
        .with_context(|| format!("calling {} from {}", args.function, args.source.display()))?;
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}

/// Initialize logging
fn init_logging(verbosity: VerbosityLevel) -> anyhow::Result<()> {
    // RUST_LOG wins over the verbosity flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.default_filter()));

    // stdout carries the result, logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
