//! # Repository Link Resolution
//!
//! Derives the downstream remotes a check run should search, from the
//! upstream repository's URL. Pure string derivation, no network calls.
//!
//! When the change lives on a fork of the canonical upstream repository,
//! contributors often push their override branch to a matching fork of the
//! downstream repository, so the fork-derived remote is searched first and
//! the canonical downstream remote second. On a canonical (non-fork) run
//! only the canonical downstream remote exists.
//!
//! The fork's downstream URL is a best-effort heuristic: the first
//! occurrence of the upstream project name in the fork URL is replaced with
//! the downstream project name. If the pattern does not match, the URL is
//! returned unchanged; the subsequent clone/fetch is what actually decides
//! reachability.

use crate::context::{project_name, repo_url, RunContext};

/// Remote name for the canonical upstream repository, added to the upstream
/// working copy.
pub const CANONICAL_UPSTREAM_REMOTE: &str = "canonical-upstream";

/// Remote name for the fork-derived downstream repository.
pub const DOWNSTREAM_REMOTE: &str = "downstream";

/// Remote name for the canonical downstream repository.
pub const CANONICAL_DOWNSTREAM_REMOTE: &str = "canonical-downstream";

/// A named remote pointing at a repository.
///
/// Remote names are unique within one check run: the run only ever uses the
/// fixed set of names defined in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub name: String,
    pub url: String,
}

impl RepositoryRef {
    pub fn new(name: &str, url: String) -> Self {
        Self {
            name: name.to_string(),
            url,
        }
    }
}

/// The ordered list of downstream remotes to attempt for this run.
pub fn downstream_remotes(ctx: &RunContext) -> Vec<RepositoryRef> {
    let canonical = RepositoryRef::new(
        CANONICAL_DOWNSTREAM_REMOTE,
        repo_url(&ctx.canonical_downstream_url),
    );

    if ctx.is_fork() {
        vec![
            RepositoryRef::new(DOWNSTREAM_REMOTE, fork_downstream_url(ctx)),
            canonical,
        ]
    } else {
        vec![canonical]
    }
}

/// Derive the downstream URL matching the upstream fork URL by substituting
/// the upstream project name with the downstream project name.
pub fn fork_downstream_url(ctx: &RunContext) -> String {
    let upstream_name = project_name(&ctx.canonical_upstream_url);
    let downstream_name = project_name(&ctx.canonical_downstream_url);
    repo_url(&ctx.upstream_url).replacen(&upstream_name, &downstream_name, 1)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::context::{RunContext, RunOptions};

    fn context(upstream_url: Option<&str>) -> RunContext {
        RunContext::new(RunOptions {
            branch: "add-widgets".to_string(),
            upstream_url: upstream_url.map(str::to_string),
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
    fn test_canonical_run_has_single_remote() {
        let remotes = downstream_remotes(&context(None));
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].name, CANONICAL_DOWNSTREAM_REMOTE);
        assert_eq!(remotes[0].url, "https://gitlab.com/acme/widget-ee.git");
    }

    #[test]
    fn test_fork_run_searches_fork_first() {
        let remotes = downstream_remotes(&context(Some(
            "https://gitlab.com/contributor/widget-ce",
        )));
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].name, DOWNSTREAM_REMOTE);
        assert_eq!(
            remotes[0].url,
            "https://gitlab.com/contributor/widget-ee.git"
        );
        assert_eq!(remotes[1].name, CANONICAL_DOWNSTREAM_REMOTE);
    }

    #[test]
    fn test_remote_names_are_unique() {
        let remotes = downstream_remotes(&context(Some(
            "https://gitlab.com/contributor/widget-ce",
        )));
        let mut names: Vec<&str> = remotes.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), remotes.len());
    }

    #[test]
    fn test_substitution_replaces_first_occurrence_only() {
        let ctx = context(Some("https://forge.example/widget-ce/widget-ce"));
        assert_eq!(
            fork_downstream_url(&ctx),
            "https://forge.example/widget-ee/widget-ce.git"
        );
    }

    #[test]
    fn test_unmatched_substitution_returns_url_unchanged() {
        // A fork URL that does not contain the upstream project name falls
        // back to itself; the clone will fail with an ordinary network
        // error downstream.
        let ctx = context(Some("https://gitlab.com/contributor/renamed"));
        assert_eq!(
            fork_downstream_url(&ctx),
            "https://gitlab.com/contributor/renamed.git"
        );
    }
}
