//! Fremit CLI - run stream pipelines over newline-delimited JSON.
//!
//! Each input line is emitted into the default engine. The pipeline is
//! assembled from `--filter`, `--unwind` and `--select` flags, and every
//! value reaching its end is printed as one JSON line on stdout. Logs go to
//! stderr or to files, never to stdout.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fremit_config::Config;

mod commands;
pub mod config_bridge;

use commands::run::PipelineSpec;

/// Fremit - push-based event stream pipelines
#[derive(Parser)]
#[command(name = "fremit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run newline-delimited JSON through a pipeline
    Run {
        /// Input file (defaults to stdin)
        input: Option<PathBuf>,

        /// Keep values whose field at PATH equals the JSON value
        #[arg(long = "filter", value_name = "PATH=JSON")]
        filters: Vec<String>,

        /// Fan out the array at PATH into one value per element
        #[arg(long = "unwind", value_name = "PATH")]
        unwinds: Vec<String>,

        /// Print only the sub-value at PATH
        #[arg(long, value_name = "PATH")]
        select: Option<String>,

        /// Path to configuration file
        #[arg(short, long, env = "FREMIT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the resolved configuration as TOML
    Config {
        /// Path to configuration file
        #[arg(short, long, env = "FREMIT_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&std::path::Path>, verbose: bool) -> Result<Config> {
    let config = Config::load(path).context("failed to load configuration")?;

    let mut log_config = config_bridge::to_log_config(&config);
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = fremit_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            filters,
            unwinds,
            select,
            config,
        } => {
            let config = load_config(config.as_deref(), cli.verbose)?;
            let spec = PipelineSpec::from_args(&filters, &unwinds, select.as_deref())?;
            commands::run::run(
                input.as_deref(),
                &spec,
                config_bridge::to_engine_config(&config),
            )?;
        },
        Commands::Config { config } => {
            let config = load_config(config.as_deref(), cli.verbose)?;
            commands::config::show_config(&config, &mut std::io::stdout().lock())?;
        },
    }

    Ok(())
}
