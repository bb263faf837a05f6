//! Chainseed CLI
//!
//! Two entry points:
//! - `generate`: build the record chains and replace the stored collections
//! - `export`: read the collections back and write metrics in exposition format
//!
//! Store and connectivity failures halt the process on the spot. Failures while
//! writing the metrics file are returned from `main` so the store session is
//! closed first.

use anyhow::{Context, Result};
use chainseed_core::{run_export, run_generation, GenerationPolicy, StoreSession};
use chainseed_storage::JsonDirStore;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;

use config::ChainseedConfig;

#[derive(Parser)]
#[command(name = "chainseed")]
#[command(
    author,
    version,
    about = "Chainseed: synthetic record chains and exposition-format metrics"
)]
struct Cli {
    /// JSON config file (store location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate record chains and replace the stored collections.
    Generate {
        /// Seed the generator for a reproducible run (default: OS entropy)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Derive metrics from the stored collections and write them to a file.
    Export {
        /// Output file
        #[arg(short, long, default_value = "metrics.txt")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { seed } => cmd_generate(&config, seed),
        Commands::Export { out } => cmd_export(&config, &out),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs and exits immediately. Pending drops (including store sessions) do not run.
fn fatal(err: impl Display) -> ! {
    tracing::error!(error = %err, "fatal error, stopping");
    eprintln!("{} {err}", "error:".red().bold());
    std::process::exit(1)
}

fn connect(config: &ChainseedConfig) -> StoreSession<JsonDirStore> {
    match JsonDirStore::connect(&config.store) {
        Ok(store) => StoreSession::new(store),
        Err(err) => fatal(err),
    }
}

fn cmd_generate(config: &ChainseedConfig, seed: Option<u64>) -> Result<()> {
    let session = connect(config);
    let store = session.store().unwrap_or_else(|err| fatal(err));

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let policy = GenerationPolicy::default();

    let summary = run_generation(store, &policy, &mut rng).unwrap_or_else(|err| fatal(err));
    eprintln!(
        "{} generated {} chain repetitions over {} day(s) into {}",
        "ok".green().bold(),
        summary.repetitions,
        summary.days_visited,
        store.dir().display()
    );
    Ok(())
}

fn cmd_export(config: &ChainseedConfig, out: &Path) -> Result<()> {
    let session = connect(config);
    let store = session.store().unwrap_or_else(|err| fatal(err));

    match run_export(store, out) {
        Ok(summary) => {
            eprintln!(
                "{} {} ({} samples from {} records)",
                "wrote".green().bold(),
                summary.path.display().to_string().bold(),
                summary.samples,
                summary.records
            );
            Ok(())
        }
        Err(err) if err.is_fatal() => fatal(err),
        Err(err) => Err(err).context("metrics export failed"),
    }
}
