//! # Compatibility Check Orchestration
//!
//! Sequences the full check: resolve remotes, generate the upstream patch,
//! probe it against the downstream target, fall back to an override-branch
//! search, and probe the override. Each phase returns either a terminal
//! [`CheckOutcome`] (an ordinary early return on the sum type: clean applies
//! and honest conflicts both halt the pipeline) or a fatal
//! [`Error`](crate::error::Error) that aborts the run from any state.
//!
//! Two gateways are involved: one bound to the upstream working copy (where
//! the change's patch is generated) and one bound to the downstream working
//! copy under the check directory (where everything else happens). Transient
//! local branches created along the way are deleted before the orchestrator
//! returns, so a working directory can be reused by the next run.

use std::fs;

use crate::context::{is_git_workdir, repo_url, RunContext};
use crate::discovery::BranchDiscovery;
use crate::error::{Error, Result};
use crate::gateway::VcsGateway;
use crate::merge_base::{fetch_to_depth, INITIAL_CLONE_DEPTH};
use crate::probe::{ApplyOutcome, ConflictReport, PatchArtifact, PatchProbe};
use crate::remotes::{
    downstream_remotes, RepositoryRef, CANONICAL_DOWNSTREAM_REMOTE, CANONICAL_UPSTREAM_REMOTE,
};
use crate::report::Reporter;

/// Depth of the initial downstream clone.
const CLONE_DEPTH: u32 = 200;

/// Terminal result of one compatibility check. Immutable once produced;
/// the on-disk patch file is a side artifact, not an authoritative record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The upstream branch applies cleanly as-is.
    Clean { branch: String },
    /// An override branch was found and applies cleanly.
    CleanWithOverride { branch: String },
    /// Neither the change nor any override applies; a human has to step in.
    Failed {
        report: ConflictReport,
        /// Remotes queried for an override branch, in query order.
        searched_remotes: Vec<RepositoryRef>,
    },
}

impl CheckOutcome {
    /// Maps the outcome to the process-level success/failure signal.
    pub fn applies_cleanly(&self) -> bool {
        matches!(
            self,
            CheckOutcome::Clean { .. } | CheckOutcome::CleanWithOverride { .. }
        )
    }
}

/// One compatibility check run over a pair of working copies.
pub struct CompatCheck<'a> {
    ctx: &'a RunContext,
    upstream: &'a dyn VcsGateway,
    downstream: &'a dyn VcsGateway,
    reporter: &'a dyn Reporter,
}

impl<'a> CompatCheck<'a> {
    pub fn new(
        ctx: &'a RunContext,
        upstream: &'a dyn VcsGateway,
        downstream: &'a dyn VcsGateway,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ctx,
            upstream,
            downstream,
            reporter,
        }
    }

    /// Run the whole check.
    ///
    /// Business outcomes (clean or conflicted) complete transient-branch
    /// cleanup before returning; fatal errors get the same cleanup on a
    /// best-effort basis only.
    pub fn run(&self) -> Result<CheckOutcome> {
        fs::create_dir_all(&self.ctx.patches_dir)?;

        let upstream_patch = self.prepare_upstream_patch()?;
        self.ensure_downstream_repo()?;
        self.setup_downstream_remotes()?;

        let mut override_branch = None;
        let outcome = self.probe_phases(&upstream_patch, &mut override_branch);
        self.delete_transient_branches(override_branch.as_deref());
        outcome
    }

    /// Generate the patch of the proposed change in the upstream working
    /// copy, against the canonical upstream target (fork `master` branches
    /// are not necessarily up to date).
    fn prepare_upstream_patch(&self) -> Result<PatchArtifact> {
        self.add_remote(
            self.upstream,
            CANONICAL_UPSTREAM_REMOTE,
            &repo_url(&self.ctx.canonical_upstream_url),
        )?;

        let probe = PatchProbe::new(self.upstream, self.reporter);
        let source = format!("origin/{}", self.ctx.branch);
        let target = format!(
            "{}/{}",
            CANONICAL_UPSTREAM_REMOTE, self.ctx.upstream_target
        );
        probe.generate(&source, &target, &self.ctx.upstream_patch_path())
    }

    /// Clone the downstream working copy if it does not exist yet, trying
    /// the fork-derived URL before the canonical one.
    fn ensure_downstream_repo(&self) -> Result<()> {
        if is_git_workdir(&self.ctx.repo_dir) {
            self.reporter.step(&format!(
                "Reusing the existing downstream working copy in {}",
                self.ctx.repo_dir.display()
            ));
            return Ok(());
        }

        let target_dir = self.ctx.repo_dir.to_string_lossy().to_string();
        let depth_arg = format!("--depth={}", CLONE_DEPTH);
        let mut last_failure = None;

        for remote in downstream_remotes(self.ctx) {
            self.reporter.step(&format!(
                "Cloning {} into {}",
                remote.url,
                self.ctx.repo_dir.display()
            ));
            let args = [
                "clone",
                "--branch",
                self.ctx.downstream_target.as_str(),
                "--single-branch",
                depth_arg.as_str(),
                remote.url.as_str(),
                target_dir.as_str(),
            ];
            self.reporter.command(&args);
            let out = self.upstream.run(&args)?;
            if out.success() {
                return Ok(());
            }
            last_failure = Some((remote.url, out.stderr));
        }

        let (url, stderr) = last_failure.unwrap_or_default();
        Err(Error::Clone { url, stderr })
    }

    /// Register the resolved downstream remotes in the downstream working
    /// copy and fetch the canonical target shallowly.
    fn setup_downstream_remotes(&self) -> Result<()> {
        self.reporter.step(&format!(
            "In the {} directory",
            self.ctx.repo_dir.display()
        ));

        for remote in downstream_remotes(self.ctx) {
            self.add_remote(self.downstream, &remote.name, &remote.url)?;
        }

        fetch_to_depth(
            self.downstream,
            self.reporter,
            &format!(
                "{}/{}",
                CANONICAL_DOWNSTREAM_REMOTE, self.ctx.downstream_target
            ),
            INITIAL_CLONE_DEPTH,
        )
    }

    /// DirectProbe → BranchSearch → OverrideProbe, with the first definitive
    /// outcome returned immediately.
    fn probe_phases(
        &self,
        upstream_patch: &PatchArtifact,
        override_branch: &mut Option<String>,
    ) -> Result<CheckOutcome> {
        let remotes = downstream_remotes(self.ctx);
        let probe = PatchProbe::new(self.downstream, self.reporter);

        let direct_report = match probe.apply(
            upstream_patch,
            &self.ctx.downstream_target,
            CANONICAL_DOWNSTREAM_REMOTE,
        )? {
            ApplyOutcome::Clean => {
                return Ok(CheckOutcome::Clean {
                    branch: self.ctx.branch.clone(),
                })
            }
            ApplyOutcome::Conflicted(report) => report,
        };

        // A stale local candidate branch would make the override checkout
        // fail, so clear leftovers from any earlier run first.
        self.delete_transient_branches(None);

        let discovery = BranchDiscovery::new(self.downstream, self.reporter);
        let Some(found) = discovery.find_override_branch(&remotes, &self.ctx.naming_hint)? else {
            return Ok(CheckOutcome::Failed {
                report: direct_report,
                searched_remotes: remotes,
            });
        };
        *override_branch = Some(found.branch.clone());

        let source = format!("{}/{}", found.remote.name, found.branch);
        let target = format!(
            "{}/{}",
            CANONICAL_DOWNSTREAM_REMOTE, self.ctx.downstream_target
        );
        let artifact = probe.generate(&source, &target, &self.ctx.patch_path(&found.branch))?;

        match probe.apply(
            &artifact,
            &self.ctx.downstream_target,
            CANONICAL_DOWNSTREAM_REMOTE,
        )? {
            ApplyOutcome::Clean => Ok(CheckOutcome::CleanWithOverride {
                branch: found.branch,
            }),
            ApplyOutcome::Conflicted(report) => Ok(CheckOutcome::Failed {
                report,
                searched_remotes: remotes,
            }),
        }
    }

    fn add_remote(&self, git: &dyn VcsGateway, name: &str, url: &str) -> Result<()> {
        self.reporter
            .step(&format!("Adding the {} remote ({})", name, url));
        let args = ["remote", "add", name, url];
        self.reporter.command(&args);
        let out = git.run(&args)?;

        if !out.success() {
            // A reused working directory already has the remote; anything
            // else is a real failure.
            if out.stderr.contains("already exists") {
                self.reporter
                    .note(&format!("Remote {} already exists, keeping it", name));
                return Ok(());
            }
            return Err(Error::RemoteAdd {
                name: name.to_string(),
                stderr: out.stderr,
            });
        }

        Ok(())
    }

    /// Delete local branches created during the run. Best effort: statuses
    /// are ignored, a branch that never existed is fine.
    fn delete_transient_branches(&self, found_branch: Option<&str>) {
        let _ = self
            .downstream
            .run(&["checkout", self.ctx.downstream_target.as_str()]);

        let mut names = vec![
            self.ctx.override_prefix.as_str(),
            self.ctx.override_suffix.as_str(),
        ];
        if let Some(found) = found_branch {
            if !names.contains(&found) {
                names.push(found);
            }
        }

        for name in names {
            let _ = self
                .downstream
                .run(&["branch", "--delete", "--force", name]);
        }
    }
}
