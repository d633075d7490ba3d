//! Default values for downstream-compat configuration.
//!
//! Centralized so commands and tests agree on the same fallbacks.

use std::path::PathBuf;

/// The target branch assumed when none is configured.
///
/// Mirrors the convention of the repositories this tool is pointed at: the
/// long-lived integration branch is `master`, and only non-default target
/// branches get a downstream-suffixed counterpart.
pub const DEFAULT_TARGET_BRANCH: &str = "master";

/// Returns the default check directory root.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/downstream-compat` (XDG Base Directory)
/// - macOS: `~/Library/Caches/downstream-compat`
/// - Windows: `{FOLDERID_LocalAppData}\downstream-compat`
///
/// Falls back to `.downstream-compat` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--check-dir` CLI flag or the
/// `DOWNSTREAM_COMPAT_CHECK_DIR` environment variable.
pub fn default_check_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".downstream-compat"))
        .join("downstream-compat")
}
