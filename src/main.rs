//! # Downstream Compat CLI
//!
//! Binary entry point for the `downstream-compat` command-line tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command.
//! - Mapping the outcome to an exit status: a check that ends in an honest
//!   conflict report exits 1 without an error message (the failure banner
//!   already said everything), while fatal errors print the error chain.
//!
//! The core logic lives in the library crate; the binary is a thin wrapper.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli.execute() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
