//! `battlesim` command line entry point.
//!
//! Reads a request document (and optionally a game-master document), runs it
//! and prints the JSON report on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use battlesim_core::config::GameMaster;
use battlesim_core::request::Request;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Timed combat simulator.
#[derive(Debug, Parser)]
#[command(name = "battlesim", version, about)]
struct Args {
    /// Request document (JSON).
    input: PathBuf,

    /// Game-master document (JSON). Without it every type matchup is neutral.
    game_master: Option<PathBuf>,

    /// Overrides the seed in the request.
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for averaged and branching runs (default: all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(&args) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "request failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<String> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the worker pool")?;
    }

    let gm = match &args.game_master {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read game master {}", path.display()))?;
            GameMaster::from_json(&text)
                .with_context(|| format!("invalid game master {}", path.display()))?
        }
        None => GameMaster::standard(),
    };

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read request {}", args.input.display()))?;
    let mut request = Request::from_json(&gm, &text)
        .with_context(|| format!("invalid request {}", args.input.display()))?;
    if let Some(seed) = args.seed {
        request.set_seed(seed);
    }
    tracing::info!(mode = request.mode(), "request loaded");

    let report = request.run(&gm).context("simulation rejected")?;
    Ok(report.to_json(args.pretty)?)
}
