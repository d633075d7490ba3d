//! End-to-end tests for the `check` command
//!
//! These tests invoke the actual CLI binary and validate its behavior from
//! a user's perspective: help output, usage errors, argument validation,
//! and exit codes (0 = applies cleanly, 1 = conflict or fatal error,
//! 2 = invalid usage, handled by clap).
//!
//! The full happy-path run is driven against a stub `git` executable on
//! `PATH` and is gated behind the `integration-tests` feature.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Test that --help flag shows help information
#[test]
fn test_check_help() {
    let mut cmd = cargo_bin_cmd!("downstream-compat");

    cmd.arg("check")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Check whether a branch applies cleanly to the downstream repository",
        ))
        .stdout(predicate::str::contains("--canonical-upstream-url"));
}

/// Test that a missing required argument is a usage error (exit code 2)
#[test]
fn test_check_missing_branch_is_usage_error() {
    let mut cmd = cargo_bin_cmd!("downstream-compat");

    cmd.env_remove("DOWNSTREAM_COMPAT_BRANCH")
        .arg("check")
        .arg("--canonical-upstream-url")
        .arg("https://example.com/acme/widget-ce")
        .arg("--canonical-downstream-url")
        .arg("https://example.com/acme/widget-ee")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--branch"));
}

/// Test that an unsafe branch name is rejected before anything runs
#[test]
fn test_check_rejects_unsafe_branch() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("downstream-compat");

    cmd.arg("check")
        .arg("--branch")
        .arg("bad branch; rm -rf /")
        .arg("--canonical-upstream-url")
        .arg("https://example.com/acme/widget-ce")
        .arg("--canonical-downstream-url")
        .arg("https://example.com/acme/widget-ee")
        .arg("--check-dir")
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsafe token"));
}

/// Test that a leading-dash branch name cannot smuggle git options
#[test]
fn test_check_rejects_option_like_branch() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("downstream-compat");

    cmd.arg("check")
        .arg("--branch=--upload-pack=evil")
        .arg("--canonical-upstream-url")
        .arg("https://example.com/acme/widget-ce")
        .arg("--canonical-downstream-url")
        .arg("https://example.com/acme/widget-ee")
        .arg("--check-dir")
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsafe token"));
}

/// Full happy-path run against a stub `git` that reports success for every
/// operation: the check must end with the success banner and exit 0.
#[test]
#[cfg(unix)]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_check_happy_path_with_stub_git() {
    use std::os::unix::fs::PermissionsExt;

    let temp = assert_fs::TempDir::new().unwrap();

    // Stub git: succeeds silently for every subcommand.
    let bin_dir = temp.path().join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    let stub = bin_dir.join("git");
    std::fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Pre-seeded downstream working copy so the stub never has to clone.
    let check_dir = temp.path().join("check");
    std::fs::create_dir_all(check_dir.join("downstream-repo/.git")).unwrap();

    let upstream_dir = temp.path().join("upstream");
    std::fs::create_dir_all(&upstream_dir).unwrap();

    let path = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").unwrap_or_default()
    );

    let mut cmd = cargo_bin_cmd!("downstream-compat");

    cmd.env("PATH", path)
        .arg("check")
        .arg("--branch")
        .arg("add-widgets")
        .arg("--canonical-upstream-url")
        .arg("https://example.com/acme/widget-ce")
        .arg("--canonical-downstream-url")
        .arg("https://example.com/acme/widget-ee")
        .arg("--upstream-dir")
        .arg(&upstream_dir)
        .arg("--check-dir")
        .arg(&check_dir)
        .arg("--color")
        .arg("never")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("applies cleanly"));

    // The patch artifact was written under the check directory.
    assert!(check_dir.join("patches/add-widgets.patch").exists());
}
