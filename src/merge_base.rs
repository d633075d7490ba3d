//! # Merge-Base Discovery Over Shallow Clones
//!
//! Working copies are cloned shallow, so two refs that share history may not
//! share any *fetched* history yet. This module deepens both sides on an
//! exponential schedule until `git merge-base` finds a common ancestor, or
//! gives up once the schedule is exhausted.
//!
//! The schedule starts from the initial clone depth of 20 and adds
//! `floor(e^factor)` commits for each factor in `3..=6`, visiting the
//! cumulative depths 40, 94, 242 and 645. Shallow divergence (the common
//! case) resolves in one round trip; deeply diverged refs cost a handful of
//! fetches instead of an unbounded full-history download, and anything not
//! found within 645 commits is reported as needing a rebase.

use std::fmt;

use crate::error::{Error, Result};
use crate::gateway::VcsGateway;
use crate::report::Reporter;

/// Depth of the initial shallow clone; deepening starts from here.
pub const INITIAL_CLONE_DEPTH: u32 = 20;

const DEEPENING_FACTORS: [u32; 4] = [3, 4, 5, 6];

/// A resolved commit id, as printed by `git merge-base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Iterator over the cumulative fetch depths of the deepening schedule.
///
/// This is the only mutable state of the search; it is created per
/// resolution and discarded afterwards.
#[derive(Debug)]
pub struct DeepeningSchedule {
    depth: u32,
    next_factor: usize,
}

impl DeepeningSchedule {
    pub fn new() -> Self {
        Self {
            depth: INITIAL_CLONE_DEPTH,
            next_factor: 0,
        }
    }
}

impl Default for DeepeningSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for DeepeningSchedule {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let factor = DEEPENING_FACTORS.get(self.next_factor)?;
        self.next_factor += 1;
        self.depth += f64::from(*factor).exp() as u32;
        Some(self.depth)
    }
}

/// Locates a common ancestor between two remote-qualified refs, deepening
/// both shallow histories as needed.
pub struct MergeBaseFinder<'a> {
    git: &'a dyn VcsGateway,
    reporter: &'a dyn Reporter,
}

impl<'a> MergeBaseFinder<'a> {
    pub fn new(git: &'a dyn VcsGateway, reporter: &'a dyn Reporter) -> Self {
        Self { git, reporter }
    }

    /// Find the merge base of `source` and `target` (both `remote/branch`).
    ///
    /// Fetches both refs at each depth of the schedule. Fetch failures are
    /// fatal and propagate immediately; an exhausted schedule reports both
    /// refs so the caller knows which side to rebase.
    pub fn find_merge_base(&self, source: &str, target: &str) -> Result<CommitId> {
        for depth in DeepeningSchedule::new() {
            fetch_to_depth(self.git, self.reporter, source, depth)?;
            fetch_to_depth(self.git, self.reporter, target, depth)?;

            if let Some(commit) = self.query_merge_base(source, target)? {
                return Ok(commit);
            }
        }

        Err(Error::TooFarBehind {
            source_ref: source.to_string(),
            target_ref: target.to_string(),
        })
    }

    fn query_merge_base(&self, source: &str, target: &str) -> Result<Option<CommitId>> {
        self.reporter
            .step(&format!("Finding merge base with {}", target));
        let args = ["merge-base", target, source];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;

        // Exit 1 just means "no common ancestor fetched yet".
        if !out.success() {
            return Ok(None);
        }

        let commit = CommitId(out.stdout.trim().to_string());
        self.reporter.note(&format!("Merge base found: {}", commit));
        Ok(Some(commit))
    }
}

/// Fetch a `remote/branch` ref up to `depth`, pruning stale remote refs.
pub(crate) fn fetch_to_depth(
    git: &dyn VcsGateway,
    reporter: &dyn Reporter,
    source: &str,
    depth: u32,
) -> Result<()> {
    let Some((remote, branch)) = source.split_once('/') else {
        return Err(Error::Fetch {
            refspec: source.to_string(),
            stderr: "ref is not remote-qualified".to_string(),
        });
    };

    let depth_arg = format!("--depth={}", depth);
    let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");

    reporter.step(&format!("Fetching {} at depth {}", source, depth));
    let args = [
        "fetch",
        depth_arg.as_str(),
        "--prune",
        remote,
        refspec.as_str(),
    ];
    reporter.command(&args);
    let out = git.run(&args)?;

    if !out.success() {
        return Err(Error::Fetch {
            refspec,
            stderr: out.stderr,
        });
    }

    Ok(())
}
