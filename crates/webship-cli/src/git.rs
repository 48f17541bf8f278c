//! Release tagging
//!
//! After a successful sync the source repository gets a force tag named
//! `<prefix>-<local timestamp>`, force-pushed to `origin`. Tag names are
//! minute-granular; deploying twice within one minute moves the tag, which
//! is what the force flags are for.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::debug;

use tokio_util::sync::CancellationToken;
use webship_core::ports::IProgressSink;

use crate::process::ProcessRunner;

/// Builds the tag name for a deployment at `at`.
pub fn tag_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}-{}", at.format("%Y-%m-%d-%H-%M"))
}

/// Locates the repository to tag.
///
/// A configured path must contain a `.git` directory; otherwise the search
/// walks upward from the current directory, at most 8 levels. Returns
/// `None` when no repository is found (the caller reports and skips
/// tagging rather than failing the deployment).
pub fn resolve_repository_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join(".git").is_dir() {
            return Some(path.to_path_buf());
        }
        debug!(path = %path.display(), "configured repository path has no .git directory");
        return None;
    }

    let mut current = std::env::current_dir().ok()?;
    for _ in 0..8 {
        if current.join(".git").is_dir() {
            return Some(current);
        }
        if !current.pop() {
            break;
        }
    }
    None
}

/// Creates and force-pushes the release tag.
pub async fn create_and_push_tag(
    runner: &ProcessRunner,
    repository: &Path,
    prefix: &str,
    progress: &dyn IProgressSink,
    cancel: &CancellationToken,
) -> Result<()> {
    let name = tag_name(prefix, Local::now());

    progress.info(&format!("Creating git tag '{name}'"));
    runner
        .run("git", &["tag", "-f", &name], repository, cancel)
        .await?;

    progress.info(&format!("Pushing git tag '{name}' to origin"));
    runner
        .run("git", &["push", "origin", &name, "--force"], repository, cancel)
        .await?;

    progress.info(&format!("Git tag '{name}' created and pushed"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tag_name_is_minute_granular() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 33).unwrap();
        assert_eq!(tag_name("deploy", at), "deploy-2024-03-09-14-05");
        assert_eq!(tag_name("release", at), "release-2024-03-09-14-05");
    }

    #[test]
    fn configured_path_requires_a_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_repository_path(Some(dir.path())), None);

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(
            resolve_repository_path(Some(dir.path())),
            Some(dir.path().to_path_buf())
        );
    }
}
