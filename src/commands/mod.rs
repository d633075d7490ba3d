//! # CLI Command Implementations
//!
//! One module per subcommand of the `downstream-compat` command-line tool.
//! Each command module contains an `Args` struct derived with `clap` and an
//! `execute` function that orchestrates the necessary operations, calling
//! into the `downstream_compat` library for the core logic.

pub mod check;
pub mod completions;
