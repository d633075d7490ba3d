//! # Run Context
//!
//! Everything a check run derives from its inputs, computed once at
//! construction and immutable afterwards: repository URLs, fork detection,
//! project name tokens, the downstream target branch, override-branch name
//! candidates, the branch-search naming hint, and the on-disk layout of the
//! check directory.
//!
//! Centralizing the derivations here keeps the orchestrator free of hidden
//! lazily-initialized state: components receive plain values and never
//! recompute a name two different ways.

use std::path::{Path, PathBuf};

use regex::Regex;
use url::Url;

use crate::defaults::DEFAULT_TARGET_BRANCH;
use crate::error::{Error, Result};

/// Inputs to [`RunContext::new`], as collected by the CLI layer.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The upstream branch carrying the proposed change.
    pub branch: String,
    /// URL of the repository the branch lives on. `None` means the canonical
    /// upstream repository; a differing value marks the run as a fork.
    pub upstream_url: Option<String>,
    /// Canonical (non-fork) upstream project URL.
    pub canonical_upstream_url: String,
    /// Canonical downstream repository URL.
    pub canonical_downstream_url: String,
    /// Upstream target branch of the proposed change.
    pub target_branch: String,
    /// Explicit downstream target branch, overriding the derived name.
    pub downstream_target_branch: Option<String>,
    /// Upstream project name token; defaults to the last path segment of the
    /// canonical upstream URL.
    pub upstream_token: Option<String>,
    /// Downstream project name token; defaults to the last path segment of
    /// the canonical downstream URL.
    pub downstream_token: Option<String>,
    /// Root directory for the downstream working copy and patch files.
    pub check_dir: PathBuf,
    /// Base URL under which generated patches are published (CI artifacts).
    pub patch_base_url: Option<String>,
}

/// Immutable per-run configuration shared by all components.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub branch: String,
    pub upstream_url: String,
    pub canonical_upstream_url: String,
    pub canonical_downstream_url: String,
    pub upstream_target: String,
    pub downstream_target: String,
    pub upstream_token: String,
    pub downstream_token: String,
    /// `<downstream-token>-<branch>`, the prefixed override candidate.
    pub override_prefix: String,
    /// `<branch>-<downstream-token>`, the suffixed override candidate.
    pub override_suffix: String,
    /// Branch-search substring: the branch name with the upstream token
    /// stripped from either end.
    pub naming_hint: String,
    pub check_dir: PathBuf,
    /// Downstream working copy, under the check directory.
    pub repo_dir: PathBuf,
    /// Patch artifact directory, under the check directory.
    pub patches_dir: PathBuf,
    pub patch_base_url: Option<String>,
}

impl RunContext {
    pub fn new(opts: RunOptions) -> Result<Self> {
        validate_ref_token(&opts.branch)?;
        validate_ref_token(&opts.target_branch)?;
        if let Some(ref target) = opts.downstream_target_branch {
            validate_ref_token(target)?;
        }

        let upstream_token = match opts.upstream_token {
            Some(token) => token,
            None => project_name(&opts.canonical_upstream_url),
        };
        let downstream_token = match opts.downstream_token {
            Some(token) => token,
            None => project_name(&opts.canonical_downstream_url),
        };
        validate_ref_token(&upstream_token)?;
        validate_ref_token(&downstream_token)?;

        let downstream_target = match opts.downstream_target_branch {
            Some(target) => target,
            // Only non-default targets have a downstream-suffixed
            // counterpart; the default target tracks upstream by name.
            None if opts.target_branch == DEFAULT_TARGET_BRANCH => opts.target_branch.clone(),
            None => format!("{}-{}", opts.target_branch, downstream_token),
        };

        let override_prefix = format!("{}-{}", downstream_token, opts.branch);
        let override_suffix = format!("{}-{}", opts.branch, downstream_token);
        let naming_hint = naming_hint(&opts.branch, &upstream_token);

        let upstream_url = opts
            .upstream_url
            .unwrap_or_else(|| opts.canonical_upstream_url.clone());

        Ok(Self {
            branch: opts.branch,
            upstream_url,
            canonical_upstream_url: opts.canonical_upstream_url,
            canonical_downstream_url: opts.canonical_downstream_url,
            upstream_target: opts.target_branch,
            downstream_target,
            upstream_token,
            downstream_token,
            override_prefix,
            override_suffix,
            naming_hint,
            repo_dir: opts.check_dir.join("downstream-repo"),
            patches_dir: opts.check_dir.join("patches"),
            check_dir: opts.check_dir,
            patch_base_url: opts.patch_base_url,
        })
    }

    /// Whether the upstream checkout is a fork of the canonical repository.
    pub fn is_fork(&self) -> bool {
        self.upstream_url != self.canonical_upstream_url
    }

    /// Patch artifact path for a patch generated from `branch`.
    pub fn patch_path(&self, branch: &str) -> PathBuf {
        self.patches_dir
            .join(format!("{}.patch", sanitize_branch_token(branch)))
    }

    /// Patch artifact path for the upstream change itself.
    pub fn upstream_patch_path(&self) -> PathBuf {
        self.patch_path(&self.branch)
    }
}

/// The downstream-search hint: the branch name with a leading
/// `<upstream-token>-` or trailing `-<upstream-token>` removed.
fn naming_hint(branch: &str, upstream_token: &str) -> String {
    let prefixed = format!("{}-", upstream_token);
    let suffixed = format!("-{}", upstream_token);
    if let Some(rest) = branch.strip_prefix(&prefixed) {
        rest.to_string()
    } else if let Some(rest) = branch.strip_suffix(&suffixed) {
        rest.to_string()
    } else {
        branch.to_string()
    }
}

/// Extract the project name from a repository URL: the last path segment
/// with any trailing `.git` stripped.
pub(crate) fn project_name(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    let segment = match Url::parse(trimmed) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| s.to_string())
            .unwrap_or_else(|| trimmed.to_string()),
        // scp-style remotes (git@host:org/project) are not URLs; fall back
        // to plain string splitting.
        Err(_) => trimmed
            .rsplit('/')
            .next()
            .and_then(|s| s.rsplit(':').next())
            .unwrap_or(trimmed)
            .to_string(),
    };
    segment.trim_end_matches(".git").to_string()
}

/// Ensure the given repository URL ends in `.git`, as fetch/clone URLs do.
pub fn repo_url(project_url: &str) -> String {
    if project_url.ends_with(".git") {
        project_url.to_string()
    } else {
        format!("{}.git", project_url)
    }
}

/// Validate a branch-, tag-, or remote-derived token against a safe
/// character set before it is handed to git as an argument.
///
/// Rejects anything that could be mistaken for an option (leading `-`),
/// traverse paths (`..`), or smuggle shell metacharacters through logs.
pub fn validate_ref_token(token: &str) -> Result<()> {
    // Compiled per call; token validation happens a handful of times per run.
    let safe = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/\-]*$").unwrap();
    if token.is_empty() || token.contains("..") || !safe.is_match(token) {
        return Err(Error::UnsafeToken {
            token: token.to_string(),
        });
    }
    Ok(())
}

/// Reduce a branch name to a lowercase filesystem-safe token for patch file
/// naming: runs of characters outside `[a-z0-9]` collapse to a single `-`.
pub fn sanitize_branch_token(branch: &str) -> String {
    let mut out = String::with_capacity(branch.len());
    let mut last_dash = true;
    for ch in branch.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "patch".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory check: does `dir` look like an existing git working copy?
pub fn is_git_workdir(dir: &Path) -> bool {
    dir.join(".git").exists()
}
