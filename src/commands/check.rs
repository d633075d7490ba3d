//! # Check Command Implementation
//!
//! This module implements the `check` subcommand: the end-to-end probe of
//! whether an upstream branch (or a developer-prepared override branch)
//! applies cleanly to the downstream repository.
//!
//! The command wires the CLI arguments into an immutable
//! [`RunContext`](downstream_compat::context::RunContext), runs the
//! orchestrator against two git gateways (one for the upstream working copy,
//! one for the downstream working copy under the check directory), and
//! renders the terminal outcome as a banner.
//!
//! The exit signal distinguishes the three ways a run can end:
//!
//! - the patch (or an override) applies: success, exit 0
//! - the patch conflicts and no usable override exists: failure banner with
//!   the conflicting files and remediation guidance, exit 1
//! - infrastructure trouble (network, clone, unfetchable refs): an error
//!   message rather than a banner, exit 1, worth retrying as-is

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use downstream_compat::context::{RunContext, RunOptions};
use downstream_compat::defaults;
use downstream_compat::gateway::GitProcess;
use downstream_compat::orchestrator::CompatCheck;
use downstream_compat::output::OutputConfig;
use downstream_compat::report::{outcome_banner, ConsoleReporter};

/// Check whether a branch applies cleanly to the downstream repository
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// The upstream branch carrying the proposed change.
    #[arg(long, value_name = "BRANCH", env = "DOWNSTREAM_COMPAT_BRANCH")]
    pub branch: String,

    /// Canonical (non-fork) upstream project URL.
    #[arg(long, value_name = "URL")]
    pub canonical_upstream_url: String,

    /// Canonical downstream repository URL.
    #[arg(long, value_name = "URL")]
    pub canonical_downstream_url: String,

    /// URL of the repository the branch actually lives on.
    ///
    /// Defaults to the canonical upstream URL; passing a different URL marks
    /// the run as a fork, which adds a fork-derived downstream remote to the
    /// override-branch search.
    #[arg(long, value_name = "URL")]
    pub upstream_url: Option<String>,

    /// Upstream target branch of the proposed change.
    #[arg(
        long,
        value_name = "BRANCH",
        env = "DOWNSTREAM_COMPAT_TARGET_BRANCH",
        default_value = defaults::DEFAULT_TARGET_BRANCH
    )]
    pub target_branch: String,

    /// Downstream target branch, overriding the derived name.
    ///
    /// By default the downstream target matches the upstream target, with
    /// `-<downstream-token>` appended for non-default targets.
    #[arg(long, value_name = "BRANCH")]
    pub downstream_target_branch: Option<String>,

    /// Upstream project token used in branch naming conventions.
    ///
    /// Defaults to the project name from the canonical upstream URL.
    #[arg(long, value_name = "TOKEN")]
    pub upstream_token: Option<String>,

    /// Downstream project token used in branch naming conventions.
    ///
    /// Defaults to the project name from the canonical downstream URL.
    #[arg(long, value_name = "TOKEN")]
    pub downstream_token: Option<String>,

    /// Path of the upstream working copy to generate the patch in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub upstream_dir: PathBuf,

    /// Root directory for the downstream working copy and patch artifacts.
    ///
    /// Defaults to the system cache directory
    /// (`~/.cache/downstream-compat` on Linux).
    #[arg(long, value_name = "DIR", env = "DOWNSTREAM_COMPAT_CHECK_DIR")]
    pub check_dir: Option<PathBuf>,

    /// Base URL under which generated patch artifacts are published.
    ///
    /// When set (typically to a CI artifact URL), the failure banner links
    /// the patch file so the override recipe is copy-pasteable.
    #[arg(long, value_name = "URL", env = "DOWNSTREAM_COMPAT_PATCH_BASE_URL")]
    pub patch_base_url: Option<String>,
}

/// Execute the `check` command.
///
/// Returns `Ok(true)` when the change (or an override branch) applies
/// cleanly, `Ok(false)` for an honest conflict outcome, and `Err` for fatal
/// infrastructure failures.
pub fn execute(args: CheckArgs, color_flag: &str) -> Result<bool> {
    let output = OutputConfig::from_env_and_flag(color_flag);
    let check_dir = args.check_dir.unwrap_or_else(defaults::default_check_root);

    let ctx = RunContext::new(RunOptions {
        branch: args.branch,
        upstream_url: args.upstream_url,
        canonical_upstream_url: args.canonical_upstream_url,
        canonical_downstream_url: args.canonical_downstream_url,
        target_branch: args.target_branch,
        downstream_target_branch: args.downstream_target_branch,
        upstream_token: args.upstream_token,
        downstream_token: args.downstream_token,
        check_dir,
        patch_base_url: args.patch_base_url,
    })?;

    log::info!(
        "checking {} against {}/{}",
        ctx.branch,
        downstream_compat::remotes::CANONICAL_DOWNSTREAM_REMOTE,
        ctx.downstream_target
    );

    let reporter = ConsoleReporter::new(output.clone());
    let upstream = GitProcess::new(&args.upstream_dir);
    let downstream = GitProcess::new(&ctx.repo_dir);

    let outcome = CompatCheck::new(&ctx, &upstream, &downstream, &reporter)
        .run()
        .context("compatibility check aborted")?;

    println!("\n{}", outcome_banner(&output, &ctx, &outcome));
    Ok(outcome.applies_cleanly())
}
