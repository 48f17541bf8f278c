//! Retention policy
//!
//! The remote tree holds data the deployment never produces: server logs
//! and user-uploaded photos. The pruner consults this predicate before
//! every deletion; a protected path is kept even when it has no local
//! counterpart. Deleting user data because the build output happens not to
//! contain it would be unrecoverable, so the rule errs on the side of
//! keeping.

use crate::config::RetentionConfig;
use crate::domain::remote_path::normalize;

/// Decides whether a remote relative path is protected from deletion.
///
/// A path is protected when any of its segments equals one of the
/// protected segment names, or when it ends in one of the protected
/// suffixes. All matching is case-insensitive. The empty path (the remote
/// base directory itself) is never protected; only descendants bearing the
/// configured names are.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    segments: Vec<String>,
    suffixes: Vec<String>,
}

impl RetentionPolicy {
    pub fn new(
        segments: impl IntoIterator<Item = impl Into<String>>,
        suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            segments: segments.into_iter().map(|s| s.into().to_lowercase()).collect(),
            suffixes: suffixes.into_iter().map(|s| s.into().to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &RetentionConfig) -> Self {
        Self::new(
            config.protected_segments.iter().cloned(),
            config.protected_suffixes.iter().cloned(),
        )
    }

    /// True when the pruner must keep `relative_path` even though it has no
    /// local counterpart.
    pub fn should_skip_deletion(&self, relative_path: &str) -> bool {
        let path = normalize(relative_path).to_lowercase();
        if path.is_empty() {
            return false;
        }

        if path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .any(|segment| self.segments.iter().any(|p| p == segment))
        {
            return true;
        }

        self.suffixes.iter().any(|suffix| path.ends_with(suffix))
    }
}

impl Default for RetentionPolicy {
    /// The stock rule: `logs` and `photos` directories, and `.log` files.
    fn default() -> Self {
        Self::new(["logs", "photos"], [".log"])
    }
}
