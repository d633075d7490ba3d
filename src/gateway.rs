//! # Version-Control Gateway
//!
//! The single doorway to git for the whole crate. Every repository operation
//! flows through the [`VcsGateway`] trait as a discrete argument list (never
//! an interpolated shell string) and returns the captured output together
//! with the exit status.
//!
//! A non-zero exit status is **data, not an error**: the probe layer needs to
//! inspect failed `git apply` runs, and `git merge-base` legitimately exits
//! non-zero when no ancestor exists yet. The only `Err` this layer produces
//! is a failure to spawn the subprocess at all.
//!
//! The production implementation, [`GitProcess`], runs the system `git`
//! binary, which automatically handles SSH keys, credential helpers, and any
//! authentication configured in the user's environment. Each `GitProcess`
//! owns one working directory; callers that operate on two repositories hold
//! two gateway values.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Captured result of a single git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit status; `-1` when the process died without one.
    pub status: i32,
}

impl GitOutput {
    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// A successful output with the given stdout and empty stderr.
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status: 0,
        }
    }

    /// A failed output with the given status and stderr.
    pub fn failed(status: i32, stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            status,
        }
    }
}

/// Synchronous gateway to a version-control subprocess.
///
/// Implementations must be pure request/response: one call, one captured
/// result, no retries and no control-flow decisions of their own.
pub trait VcsGateway {
    /// Run a git command with the given arguments.
    fn run(&self, args: &[&str]) -> Result<GitOutput>;
}

/// Runs the system `git` binary against a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitProcess {
    workdir: PathBuf,
}

impl GitProcess {
    /// Create a gateway bound to `workdir`. The directory does not need to
    /// exist yet (it may be created by a later clone), but every `run` call
    /// requires it.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// The working directory this gateway operates in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl VcsGateway for GitProcess {
    fn run(&self, args: &[&str]) -> Result<GitOutput> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.workdir);
        cmd.args(args);

        // Ignore system and user git config for reproducible behavior, and
        // never let git sit on an interactive credential prompt in CI.
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        let output = cmd.output().map_err(|e| Error::Spawn {
            command: format!("git {}", args.join(" ")),
            source: e,
        })?;

        let result = GitOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code().unwrap_or(-1),
        };

        log::debug!(
            "git {} (in {}) -> {}",
            args.join(" "),
            self.workdir.display(),
            result.status
        );
        if !result.stderr.is_empty() {
            log::trace!("stderr: {}", result.stderr.trim_end());
        }

        Ok(result)
    }
}

/// Scripted gateway double for unit tests.
///
/// Responds from an ordered list of rules; the first rule that returns
/// `Some` wins, and anything unmatched succeeds with empty output. Every
/// invocation is recorded for assertions.
#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;

    use super::{GitOutput, VcsGateway};
    use crate::error::Result;

    type Responder = Box<dyn Fn(&[String]) -> Option<GitOutput>>;

    #[derive(Default)]
    pub struct FakeGit {
        rules: Vec<Responder>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeGit {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond with `output` to any command whose arguments start with
        /// `prefix`.
        pub fn on(mut self, prefix: &[&str], output: GitOutput) -> Self {
            let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            self.rules.push(Box::new(move |args| {
                if args.len() >= prefix.len() && args[..prefix.len()] == prefix[..] {
                    Some(output.clone())
                } else {
                    None
                }
            }));
            self
        }

        /// Respond from an arbitrary closure; return `None` to fall through
        /// to the next rule.
        pub fn on_fn(mut self, f: impl Fn(&[String]) -> Option<GitOutput> + 'static) -> Self {
            self.rules.push(Box::new(f));
            self
        }

        /// All recorded invocations, in order.
        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        /// Number of recorded invocations starting with `prefix`.
        pub fn count_calls(&self, prefix: &[&str]) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|args| {
                    args.len() >= prefix.len()
                        && args[..prefix.len()]
                            .iter()
                            .zip(prefix.iter())
                            .all(|(a, p)| a == p)
                })
                .count()
        }
    }

    impl VcsGateway for FakeGit {
        fn run(&self, args: &[&str]) -> Result<GitOutput> {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            self.calls.borrow_mut().push(args.clone());
            for rule in &self.rules {
                if let Some(output) = rule(&args) {
                    return Ok(output);
                }
            }
            Ok(GitOutput::ok(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeGit;
    use super::*;

    #[test]
    fn test_git_output_success() {
        assert!(GitOutput::ok("").success());
        assert!(!GitOutput::failed(1, "boom").success());
    }

    #[test]
    fn test_git_process_spawn_error_in_missing_dir() {
        let git = GitProcess::new("/nonexistent/directory/for/sure");
        let err = git.run(&["status"]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_git_process_captures_status() {
        // `git --version` works without a repository; the workdir just has
        // to exist.
        let tmp = tempfile::tempdir().unwrap();
        let git = GitProcess::new(tmp.path());
        let out = git.run(&["--version"]).unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("git version"));
    }

    #[test]
    fn test_fake_git_rules_and_recording() {
        let fake = FakeGit::new()
            .on(&["merge-base"], GitOutput::failed(1, ""))
            .on(&["fetch"], GitOutput::ok(""));

        assert_eq!(fake.run(&["fetch", "origin"]).unwrap().status, 0);
        assert_eq!(fake.run(&["merge-base", "a", "b"]).unwrap().status, 1);
        // Unmatched commands succeed by default.
        assert!(fake.run(&["checkout", "master"]).unwrap().success());

        assert_eq!(fake.calls().len(), 3);
        assert_eq!(fake.count_calls(&["fetch"]), 1);
        assert_eq!(fake.count_calls(&["merge-base"]), 1);
    }
}
