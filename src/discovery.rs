//! # Override-Branch Discovery
//!
//! When the direct probe conflicts, a developer may have prepared an
//! override branch on the downstream side whose name embeds the upstream
//! branch name. This module searches the resolved remotes, in priority
//! order, for branches or tags containing the naming hint and picks the
//! shortest matching name: the most minimal, and therefore most specific,
//! override for the change under test.
//!
//! An unreachable remote is skipped rather than failing the search: the
//! fork-derived remote is a guess (see [`crate::remotes`]) and frequently
//! does not exist.

use regex::Regex;

use crate::context::validate_ref_token;
use crate::error::{Error, Result};
use crate::gateway::VcsGateway;
use crate::remotes::RepositoryRef;
use crate::report::Reporter;

/// A branch fully qualified by the remote it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub remote: RepositoryRef,
    pub branch: String,
}

/// Searches remotes for an override branch matching a naming hint.
pub struct BranchDiscovery<'a> {
    git: &'a dyn VcsGateway,
    reporter: &'a dyn Reporter,
}

impl<'a> BranchDiscovery<'a> {
    pub fn new(git: &'a dyn VcsGateway, reporter: &'a dyn Reporter) -> Self {
        Self { git, reporter }
    }

    /// Search `remotes` in order for a branch or tag whose name contains
    /// `naming_hint`; fetch and check out the winner as a local branch.
    ///
    /// Returns `None` when no remote has a match. The first remote with at
    /// least one match wins, and within a remote the shortest name wins.
    pub fn find_override_branch(
        &self,
        remotes: &[RepositoryRef],
        naming_hint: &str,
    ) -> Result<Option<BranchRef>> {
        let ref_name = Regex::new(r"refs/(?:heads|tags)/(.+)$").unwrap();
        let pattern = format!("*{}*", naming_hint);

        for remote in remotes {
            self.reporter.step(&format!("Searching {}", remote.name));
            let args = ["ls-remote", remote.name.as_str(), pattern.as_str()];
            self.reporter.command(&args);
            let out = self.git.run(&args)?;

            if !out.success() {
                // A missing fork remote is an expected dead end, not a
                // failure of the search.
                self.reporter
                    .note(&format!("{} is not reachable, skipping", remote.name));
                continue;
            }

            let mut matches: Vec<String> = out
                .stdout
                .lines()
                .filter_map(|line| ref_name.captures(line))
                .map(|caps| caps[1].to_string())
                .collect();
            matches.sort_by_key(String::len);

            let Some(branch) = matches.into_iter().next() else {
                continue;
            };
            validate_ref_token(&branch)?;

            self.reporter
                .note(&format!("Found override branch {}", branch));
            self.fetch_and_checkout(remote, &branch)?;

            return Ok(Some(BranchRef {
                remote: remote.clone(),
                branch,
            }));
        }

        Ok(None)
    }

    fn fetch_and_checkout(&self, remote: &RepositoryRef, branch: &str) -> Result<()> {
        self.reporter
            .step(&format!("Fetching {}/{}", remote.name, branch));
        let args = ["fetch", remote.name.as_str(), branch];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;
        if !out.success() {
            return Err(Error::Fetch {
                refspec: format!("{}/{}", remote.name, branch),
                stderr: out.stderr,
            });
        }

        let tracking = format!("{}/{}", remote.name, branch);
        self.reporter
            .step(&format!("Checking out {}", tracking));
        let args = ["checkout", "-b", branch, tracking.as_str()];
        self.reporter.command(&args);
        let out = self.git.run(&args)?;
        if !out.success() {
            return Err(Error::Checkout {
                rev: tracking,
                stderr: out.stderr,
            });
        }

        Ok(())
    }
}
