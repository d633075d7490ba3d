//! # Patch Probing
//!
//! Generates a binary-safe patch between two refs and test-applies it to a
//! freshly reset copy of the target branch. Applying is a *probe*, never a
//! commit: the working tree is hard-reset after every attempt so the next
//! probe starts from the same state.
//!
//! A failed `git apply` is not automatically a failed probe. The apply
//! error stream is parsed for the files that did not apply, and conflicts
//! confined to cosmetic files (version and changelog files) are ignored:
//! those conflict on nearly every release and say nothing about the change
//! under test.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};
use crate::gateway::VcsGateway;
use crate::merge_base::MergeBaseFinder;
use crate::report::Reporter;

/// Conflicts in files matching this pattern never fail a probe.
const IGNORED_FILES_PATTERN: &str = r"(?i)VERSION|CHANGELOG\.md";

/// Prefix of the `git apply` stderr lines naming a failed file.
const PATCH_FAILED_PREFIX: &str = "error: patch failed: ";

/// A generated diff stored on disk, owned by the orchestrator for the
/// lifetime of one check. Recreated (never reused) on each run.
#[derive(Debug, Clone)]
pub struct PatchArtifact {
    pub path: PathBuf,
    pub source: String,
    pub target: String,
    /// Generated with `--binary`, so binary hunks survive the round trip.
    pub binary_safe: bool,
}

/// Files that failed to apply, in the order git reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub failed_files: Vec<String>,
}

/// Classification of one apply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The patch applies (possibly with only ignorable conflicts).
    Clean,
    /// The patch conflicts in files that matter.
    Conflicted(ConflictReport),
}

/// Generates patches and test-applies them through a gateway.
pub struct PatchProbe<'a> {
    git: &'a dyn VcsGateway,
    reporter: &'a dyn Reporter,
    ignored_files: Regex,
}

impl<'a> PatchProbe<'a> {
    pub fn new(git: &'a dyn VcsGateway, reporter: &'a dyn Reporter) -> Self {
        Self {
            git,
            reporter,
            ignored_files: Regex::new(IGNORED_FILES_PATTERN).unwrap(),
        }
    }

    /// Generate the patch of changes unique to `source` since its merge
    /// base with `target`, writing it to `path`.
    ///
    /// The merge-base lookup runs first and aborts the whole check if the
    /// refs share no fetchable history. Any stale artifact at `path` is
    /// removed before regeneration.
    pub fn generate(&self, source: &str, target: &str, path: &Path) -> Result<PatchArtifact> {
        self.reporter.step(&format!(
            "Generating the patch against {} in {}",
            target,
            path.display()
        ));

        remove_stale(path)?;

        MergeBaseFinder::new(self.git, self.reporter).find_merge_base(source, target)?;

        // Three-dot range: only the changes unique to source.
        let range = format!("{}...{}", target, source);
        let args = ["diff", "--binary", range.as_str()];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;
        if !out.success() {
            return Err(Error::Diff {
                range,
                stderr: out.stderr,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &out.stdout)?;

        if !path.exists() {
            return Err(Error::PatchMissing {
                path: path.to_path_buf(),
            });
        }

        log::debug!(
            "wrote binary-safe patch ({} bytes) to {}",
            out.stdout.len(),
            path.display()
        );

        Ok(PatchArtifact {
            path: path.to_path_buf(),
            source: source.to_string(),
            target: target.to_string(),
            binary_safe: true,
        })
    }

    /// Test-apply `artifact` onto a pristine `target_branch`.
    ///
    /// The branch is checked out and hard-reset to the canonical tip before
    /// the attempt, and the working tree is hard-reset again afterwards
    /// whatever the outcome, so probes can be repeated against the same
    /// working copy.
    pub fn apply(
        &self,
        artifact: &PatchArtifact,
        target_branch: &str,
        canonical_remote: &str,
    ) -> Result<ApplyOutcome> {
        self.reporter
            .step(&format!("Checking out {}", target_branch));
        let args = ["checkout", target_branch];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;
        if !out.success() {
            return Err(Error::Checkout {
                rev: target_branch.to_string(),
                stderr: out.stderr,
            });
        }

        let tip = format!("{}/{}", canonical_remote, target_branch);
        self.reporter
            .step(&format!("Resetting to latest {}", tip));
        let args = ["reset", "--hard", tip.as_str()];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;
        if !out.success() {
            return Err(Error::Reset {
                rev: tip,
                stderr: out.stderr,
            });
        }

        self.reporter.step(&format!(
            "Checking if {} applies cleanly to {}",
            artifact.path.display(),
            target_branch
        ));
        // Not `apply --check`: it can exit 0 while the patch only applies
        // with a conflicted three-way merge.
        let patch = artifact.path.to_string_lossy().to_string();
        let args = ["apply", "--3way", patch.as_str()];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;

        // Leave the tree pristine for the next probe, whatever happened.
        let _ = self.git.run(&["reset", "--hard"]);

        if out.success() {
            return Ok(ApplyOutcome::Clean);
        }

        let failed_files = self.failed_files(&out.stderr);
        if failed_files.is_empty() {
            self.reporter
                .note("Only ignorable files conflicted, treating the patch as applying cleanly");
            return Ok(ApplyOutcome::Clean);
        }

        Ok(ApplyOutcome::Conflicted(ConflictReport { failed_files }))
    }

    /// Extract the non-ignorable failed files from the apply error stream.
    fn failed_files(&self, stderr: &str) -> Vec<String> {
        stderr
            .lines()
            .filter_map(|line| line.strip_prefix(PATCH_FAILED_PREFIX))
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !self.ignored_files.is_match(entry))
            .collect()
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
