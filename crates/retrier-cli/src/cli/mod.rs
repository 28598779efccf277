//! CLI for the retrier engine.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retrier_core::config;
use retrier_core::configuration::global;

use commands::{run_config, run_exec, run_table, ExecArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "retrier")]
#[command(about = "Retry commands and inspect backoff tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the backoff table a strategy generates.
    Table {
        /// constant, linear, fibonacci or exponential.
        kind: String,
        /// First interval in seconds.
        #[arg(long, default_value = "1")]
        start: u64,
        /// Multiplier for linear tables.
        #[arg(long, default_value = "1")]
        factor: u64,
        /// Number of intervals.
        #[arg(long, default_value = "10")]
        retries: usize,
    },

    /// Show the effective default retry configuration.
    Config,

    /// Run a command, retrying while it fails.
    Exec(ExecArgs),
}

impl CliCommand {
    /// Returns the process exit code.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let file_cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", file_cfg);
        let defaults = file_cfg
            .to_configuration()
            .context("invalid retry settings in config file")?;
        global::configure(|c| {
            *c = defaults;
            Ok(())
        })?;

        match cli.command {
            CliCommand::Table {
                kind,
                start,
                factor,
                retries,
            } => run_table(&kind, start, factor, retries)?,
            CliCommand::Config => run_config()?,
            CliCommand::Exec(args) => return run_exec(&args),
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests;
