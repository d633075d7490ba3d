//! # Downstream Compatibility Checker Library
//!
//! This library implements a cross-repository patch-compatibility verifier:
//! given a change proposed against an upstream repository, it determines
//! whether that change (or a developer-supplied override branch) applies
//! cleanly to a linked downstream repository that tracks the upstream one
//! but has diverged.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::PathBuf;
//! use downstream_compat::context::{RunContext, RunOptions};
//!
//! let ctx = RunContext::new(RunOptions {
//!     branch: "add-widgets".to_string(),
//!     upstream_url: None,
//!     canonical_upstream_url: "https://gitlab.com/acme/widget-ce".to_string(),
//!     canonical_downstream_url: "https://gitlab.com/acme/widget-ee".to_string(),
//!     target_branch: "master".to_string(),
//!     downstream_target_branch: None,
//!     upstream_token: Some("ce".to_string()),
//!     downstream_token: Some("ee".to_string()),
//!     check_dir: PathBuf::from("/tmp/compat-check"),
//!     patch_base_url: None,
//! }).unwrap();
//!
//! // Derived once, used everywhere: override candidates and patch naming.
//! assert_eq!(ctx.override_prefix, "ee-add-widgets");
//! assert_eq!(ctx.override_suffix, "add-widgets-ee");
//! assert!(ctx.upstream_patch_path().ends_with("patches/add-widgets.patch"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Run context (`context`)**: every name and path a run derives from its
//!   inputs, computed once and immutable afterwards.
//! - **Gateway (`gateway`)**: the single doorway to the system `git` binary.
//!   Non-zero exit statuses are data for the caller, not errors.
//! - **Merge-base search (`merge_base`)**: adaptive deepening of two shallow
//!   histories until a common ancestor is found.
//! - **Patch probing (`probe`)**: patch generation and non-committing
//!   three-way test application, with conflict classification.
//! - **Branch discovery (`discovery`)**: the multi-remote search for a
//!   developer-prepared override branch.
//! - **Orchestration (`orchestrator`)**: the full check pipeline, returning a
//!   [`orchestrator::CheckOutcome`] that separates expected business failures
//!   from fatal infrastructure errors.
//!
//! ## Execution Flow
//!
//! The orchestrator executes the following high-level steps:
//!
//! 1.  Resolve the downstream remotes to search (`remotes`).
//! 2.  Generate the upstream patch against the canonical upstream target.
//! 3.  Ensure the downstream working copy exists (clone with fallback).
//! 4.  Probe the patch directly against the downstream target; a clean apply
//!     ends the check.
//! 5.  Otherwise search the remotes for an override branch; none found ends
//!     the check as `Failed`.
//! 6.  Probe the override branch the same way and report either
//!     `CleanWithOverride` or `Failed` with the conflicting files.
//!
//! The check never commits or pushes; the downstream working tree is reset
//! after every probe so a working directory can be reused across runs.

pub mod context;
pub mod defaults;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod merge_base;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod remotes;
pub mod report;

#[cfg(test)]
mod token_proptest;
