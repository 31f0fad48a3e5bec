#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Gate Defence session.

mod autoplay;
mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Runs an autoplayed Gate Defence session and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "gate-defence", version)]
struct Args {
    /// TOML file overriding the built-in configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of waves to play before stopping.
    #[arg(short, long, default_value_t = 3)]
    waves: u32,
    /// Seed replacing the configured one.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    dt_ms: u64,
    /// Upper bound on the number of simulated ticks.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Entry point for the Gate Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    ensure!(args.dt_ms > 0, "--dt-ms must be positive");
    ensure!(args.waves > 0, "--waves must be positive");

    let mut game = config::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        game.seed = seed;
    }

    let summary = autoplay::run(
        game,
        &autoplay::Options {
            waves: args.waves,
            dt: Duration::from_millis(args.dt_ms),
            max_ticks: args.max_ticks,
        },
    )?;
    println!("{summary}");
    Ok(())
}
