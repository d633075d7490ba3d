//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Downstream Compat - Verify that upstream changes apply to a downstream repository
#[derive(Parser, Debug)]
#[command(name = "downstream-compat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a branch applies cleanly to the downstream repository
    Check(commands::check::CheckArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// Returns whether the invocation counts as a success for exit-code
    /// purposes: a compatibility check that ends in a conflict report
    /// returns `Ok(false)` rather than an error.
    pub fn execute(self) -> Result<bool> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .init();

        match self.command {
            Commands::Check(args) => commands::check::execute(args, &self.color),
            Commands::Completions(args) => {
                commands::completions::execute(args)?;
                Ok(true)
            }
        }
    }
}
