//! # Error Handling
//!
//! Centralized error type for the `downstream-compat` library, built with
//! `thiserror`. The enum covers the *fatal* failure modes only: everything
//! that should abort a check run outright (subprocess trouble, failed
//! fetches/clones, a missing patch artifact, an exhausted merge-base search,
//! or an unsafe user-derived token).
//!
//! "The patch does not apply cleanly" and "no override branch exists" are
//! deliberately **not** errors; they are expected business outcomes carried
//! by [`crate::orchestrator::CheckOutcome`]. Keeping them out of this enum is
//! what lets callers distinguish "retry the job" (infrastructure) from "a
//! human needs to prepare an override branch" (informative result).
//!
//! - **`Error`**: the fatal error enum. Variants carry the context needed to
//!   render an actionable message (remote name, refspec, captured stderr).
//! - **`Result<T>`**: alias for `std::result::Result<T, Error>` used
//!   throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal error type for downstream-compat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Adding a named remote failed for a reason other than the remote
    /// already existing.
    #[error("Failed to add remote '{name}': {stderr}")]
    RemoteAdd { name: String, stderr: String },

    /// Cloning the downstream repository failed from every candidate URL.
    #[error("Failed to clone {url}: {stderr}")]
    Clone { url: String, stderr: String },

    /// A fetch returned a non-zero status. Fetches are never retried.
    #[error("Fetch failed for {refspec}: {stderr}")]
    Fetch { refspec: String, stderr: String },

    /// Checking out a branch or ref failed.
    #[error("Failed to check out '{rev}': {stderr}")]
    Checkout { rev: String, stderr: String },

    /// Hard reset to a known tip failed.
    #[error("Failed to reset to '{rev}': {stderr}")]
    Reset { rev: String, stderr: String },

    /// Diff generation returned a non-zero status.
    #[error("Failed to generate diff for '{range}': {stderr}")]
    Diff { range: String, stderr: String },

    /// The patch file did not exist after generation.
    #[error("Patch file missing after generation: {path}")]
    PatchMissing { path: PathBuf },

    /// The merge-base search exhausted its depth schedule without finding a
    /// common ancestor. Both refs are reported so the caller knows which
    /// side to rebase.
    #[error("{source_ref} is too far behind {target_ref}, please rebase it")]
    TooFarBehind {
        source_ref: String,
        target_ref: String,
    },

    /// A branch- or remote-derived token contains characters outside the
    /// safe set and will not be passed to git.
    #[error("Refusing to use unsafe token '{token}'")]
    UnsafeToken { token: String },

    /// Spawning the version-control subprocess failed (binary missing,
    /// working directory gone).
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
