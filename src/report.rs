//! # Progress Reporting and Outcome Rendering
//!
//! The core emits a stream of step descriptions and echoed git command
//! lines through the [`Reporter`] trait while it runs, and the terminal
//! [`CheckOutcome`](crate::orchestrator::CheckOutcome) is rendered to a
//! human-readable banner at the end. All structured data the banners need
//! (branch names, remote names and URLs, conflicting files, patch paths)
//! comes from the outcome and the run context; nothing is re-derived here.

use crate::context::{repo_url, RunContext};
use crate::orchestrator::CheckOutcome;
use crate::output::{emoji, OutputConfig};

/// Receives progress events while a check runs.
pub trait Reporter {
    /// Announce a step about to run.
    fn step(&self, description: &str);

    /// Echo the exact git invocation about to run.
    fn command(&self, args: &[&str]);

    /// Free-form progress detail (merge base found, branches matched, ...).
    fn note(&self, text: &str);
}

/// Line-oriented console reporter, suitable for CI logs.
pub struct ConsoleReporter {
    config: OutputConfig,
}

impl ConsoleReporter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }
}

impl Reporter for ConsoleReporter {
    fn step(&self, description: &str) {
        println!("\n=> {}", description);
    }

    fn command(&self, args: &[&str]) {
        println!("{}", self.config.dim(&format!("   $ git {}", args.join(" "))));
    }

    fn note(&self, text: &str) {
        println!("   {}", text);
    }
}

/// Reporter that discards everything. Used by tests and embedders that only
/// care about the returned outcome.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step(&self, _description: &str) {}
    fn command(&self, _args: &[&str]) {}
    fn note(&self, _text: &str) {}
}

const BANNER_RULE: &str = "============================================================";

/// Render the terminal outcome as a human-readable banner.
pub fn outcome_banner(config: &OutputConfig, ctx: &RunContext, outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::Clean { branch } => applies_cleanly_banner(config, ctx, branch, false),
        CheckOutcome::CleanWithOverride { branch } => {
            applies_cleanly_banner(config, ctx, branch, true)
        }
        CheckOutcome::Failed {
            report,
            searched_remotes,
        } => {
            let mut out = String::new();
            out.push_str(BANNER_RULE);
            out.push('\n');
            out.push_str(&config.failure(&format!(
                "{} The `{}` branch does not apply cleanly to {}/{}.",
                emoji(config, "💥", "[FAILED]"),
                ctx.branch,
                crate::remotes::CANONICAL_DOWNSTREAM_REMOTE,
                ctx.downstream_target,
            )));
            out.push('\n');

            if !searched_remotes.is_empty() {
                out.push_str("\nRemotes searched for an override branch:\n");
                for remote in searched_remotes {
                    out.push_str(&format!("  - {} ({})\n", remote.name, remote.url));
                }
            }

            out.push_str("\nThe conflicts detected were as follows:\n");
            for file in &report.failed_files {
                out.push_str(&format!("  - {}\n", file));
            }

            out.push_str(&remediation_guidance(ctx));
            out.push_str(BANNER_RULE);
            out
        }
    }
}

fn applies_cleanly_banner(
    config: &OutputConfig,
    ctx: &RunContext,
    branch: &str,
    via_override: bool,
) -> String {
    let mut out = String::new();
    out.push_str(BANNER_RULE);
    out.push('\n');
    out.push_str(&config.success(&format!(
        "{} The `{}` branch applies cleanly to {}/{}!",
        emoji(config, "🎉", "[OK]"),
        branch,
        crate::remotes::CANONICAL_DOWNSTREAM_REMOTE,
        ctx.downstream_target,
    )));
    out.push('\n');
    if via_override {
        out.push_str(&format!(
            "(using the `{}` override branch instead of `{}` directly)\n",
            branch, ctx.branch
        ));
    }
    out.push_str(BANNER_RULE);
    out
}

/// The recipes for preparing an override branch, rendered into the failure
/// banner. Everything here is copy-pasteable: real URLs, real branch names.
fn remediation_guidance(ctx: &RunContext) -> String {
    let downstream_url = repo_url(&ctx.canonical_downstream_url);
    let upstream_url = repo_url(&ctx.upstream_url);
    let patch_name = format!(
        "{}.patch",
        crate::context::sanitize_branch_token(&ctx.branch)
    );

    let mut out = String::new();
    out.push_str(&format!(
        "\nWe advise you to create a `{}` or `{}` branch that includes\n\
         changes from `{}` but also changes that apply cleanly to the\n\
         downstream `{}` branch. There are two ways to do that:\n",
        ctx.override_prefix, ctx.override_suffix, ctx.branch, ctx.downstream_target
    ));

    out.push_str(&format!(
        "\n1. Cherry-pick your commits onto the downstream target\n\
         \n   $ git fetch {downstream_url} {target}\n\
         \x20  $ git checkout -b {prefix} FETCH_HEAD\n\
         \x20  $ git fetch {upstream_url} {branch}\n\
         \x20  $ git cherry-pick SHA   # repeat for each commit you want\n",
        downstream_url = downstream_url,
        target = ctx.downstream_target,
        prefix = ctx.override_prefix,
        upstream_url = upstream_url,
        branch = ctx.branch,
    ));

    out.push_str(&format!(
        "\n2. Apply the generated patch onto the downstream target\n\
         \n   $ git fetch {downstream_url} {target}\n\
         \x20  $ git checkout -b {prefix} FETCH_HEAD\n",
        downstream_url = downstream_url,
        target = ctx.downstream_target,
        prefix = ctx.override_prefix,
    ));
    match &ctx.patch_base_url {
        Some(base) => out.push_str(&format!(
            "   $ wget {}/{} && git apply --3way {}\n",
            base.trim_end_matches('/'),
            patch_name,
            patch_name
        )),
        None => out.push_str(&format!("   $ git apply --3way {}\n", patch_name)),
    }
    out.push_str(&format!(
        "\n   If the patch does not apply cleanly, `git apply --reject {}`\n\
         \x20  keeps the rejected hunks in `.rej` files for manual resolution.\n",
        patch_name
    ));

    out.push_str(&format!(
        "\nOnce the branch is pushed to the downstream repository, retry this\n\
         job: it will find `{}` (or `{}`) and probe it instead.\n\n",
        ctx.override_prefix, ctx.override_suffix
    ));

    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::context::{RunContext, RunOptions};
    use crate::orchestrator::CheckOutcome;
    use crate::probe::ConflictReport;
    use crate::remotes::RepositoryRef;

    fn context() -> RunContext {
        RunContext::new(RunOptions {
            branch: "add-widgets".to_string(),
            upstream_url: None,
            canonical_upstream_url: "https://gitlab.com/acme/widget-ce".to_string(),
            canonical_downstream_url: "https://gitlab.com/acme/widget-ee".to_string(),
            target_branch: "master".to_string(),
            downstream_target_branch: None,
            upstream_token: Some("ce".to_string()),
            downstream_token: Some("ee".to_string()),
            check_dir: PathBuf::from("/tmp/check"),
            patch_base_url: None,
        })
        .unwrap()
    }

    #[test]
    fn test_clean_banner_names_branch_and_target() {
        let banner = outcome_banner(
            &OutputConfig::without_color(),
            &context(),
            &CheckOutcome::Clean {
                branch: "add-widgets".to_string(),
            },
        );
        assert!(banner.contains("`add-widgets`"));
        assert!(banner.contains("canonical-downstream/master"));
        assert!(banner.contains("[OK]"));
    }

    #[test]
    fn test_override_banner_mentions_both_branches() {
        let banner = outcome_banner(
            &OutputConfig::without_color(),
            &context(),
            &CheckOutcome::CleanWithOverride {
                branch: "add-widgets-ee".to_string(),
            },
        );
        assert!(banner.contains("`add-widgets-ee`"));
        assert!(banner.contains("override branch"));
    }

    #[test]
    fn test_failed_banner_lists_conflicts_and_remotes() {
        let outcome = CheckOutcome::Failed {
            report: ConflictReport {
                failed_files: vec!["lib/foo.rb:12".to_string(), "app/bar.rb:3".to_string()],
            },
            searched_remotes: vec![RepositoryRef::new(
                "canonical-downstream",
                "https://gitlab.com/acme/widget-ee.git".to_string(),
            )],
        };
        let banner = outcome_banner(&OutputConfig::without_color(), &context(), &outcome);
        assert!(banner.contains("lib/foo.rb:12"));
        assert!(banner.contains("app/bar.rb:3"));
        assert!(banner.contains("canonical-downstream"));
        assert!(banner.contains("ee-add-widgets"));
        assert!(banner.contains("add-widgets-ee"));
        assert!(banner.contains("git apply --3way add-widgets.patch"));
        assert!(banner.contains("[FAILED]"));
    }

    #[test]
    fn test_failed_banner_links_patch_artifact_when_configured() {
        let mut ctx = context();
        ctx.patch_base_url = Some("https://ci.example/artifacts/patches".to_string());
        let outcome = CheckOutcome::Failed {
            report: ConflictReport {
                failed_files: vec!["lib/foo.rb:12".to_string()],
            },
            searched_remotes: vec![],
        };
        let banner = outcome_banner(&OutputConfig::without_color(), &ctx, &outcome);
        assert!(banner.contains("wget https://ci.example/artifacts/patches/add-widgets.patch"));
    }
}
