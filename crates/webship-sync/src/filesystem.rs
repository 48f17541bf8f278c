//! Local filesystem adapter
//!
//! Implements the local-tree port over `tokio::fs`. Strictly read-only:
//! the mirror engine only ever mutates the remote side.

use std::path::{Path, PathBuf};

use anyhow::Context;
use webship_core::domain::remote_path::normalize;
use webship_core::ports::ILocalTree;

/// Read-only view of a local directory tree
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTree;

impl LocalTree {
    pub fn new() -> Self {
        Self
    }
}

/// Renders `path` relative to `root` in the canonical slash form.
fn relative_string(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(normalize(&joined))
}

/// Walks `dir` recursively, appending every file and directory found.
fn walk<'a>(
    root: &'a Path,
    dir: &'a Path,
    files: &'a mut Vec<String>,
    directories: &'a mut Vec<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("reading directory {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                if let Some(relative) = relative_string(root, &path) {
                    directories.push(relative);
                }
                walk(root, &path, files, directories).await?;
            } else if file_type.is_file() {
                if let Some(relative) = relative_string(root, &path) {
                    files.push(relative);
                }
            }
        }

        Ok(())
    })
}

#[async_trait::async_trait]
impl ILocalTree for LocalTree {
    async fn exists(&self, dir: &Path) -> bool {
        tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn subdirectories(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("reading directory {}", dir.display()))?;
        let mut directories = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                directories.push(entry.path());
            }
        }
        Ok(directories)
    }

    async fn files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("reading directory {}", dir.display()))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    async fn relative_files(&self, root: &Path) -> anyhow::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut directories = Vec::new();
        walk(root, root, &mut files, &mut directories).await?;
        Ok(files)
    }

    async fn relative_directories(&self, root: &Path) -> anyhow::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut directories = Vec::new();
        walk(root, root, &mut files, &mut directories).await?;
        Ok(directories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("sub/nested")).unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("sub/nested/c.txt"), b"c").unwrap();
        dir
    }

    #[tokio::test]
    async fn exists_distinguishes_directories() {
        let dir = fixture();
        let tree = LocalTree::new();
        assert!(tree.exists(dir.path()).await);
        assert!(!tree.exists(&dir.path().join("a.txt")).await);
        assert!(!tree.exists(&dir.path().join("missing")).await);
    }

    #[tokio::test]
    async fn immediate_listings_split_files_and_directories() {
        let dir = fixture();
        let tree = LocalTree::new();

        let mut subdirs: Vec<String> = tree
            .subdirectories(dir.path())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        subdirs.sort();
        assert_eq!(subdirs, vec!["empty", "sub"]);

        let files: Vec<String> = tree
            .files(dir.path())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn relative_listings_use_canonical_form() {
        let dir = fixture();
        let tree = LocalTree::new();

        let mut files = tree.relative_files(dir.path()).await.unwrap();
        files.sort();
        assert_eq!(files, vec!["a.txt", "sub/b.txt", "sub/nested/c.txt"]);

        let mut directories = tree.relative_directories(dir.path()).await.unwrap();
        directories.sort();
        assert_eq!(directories, vec!["empty", "sub", "sub/nested"]);
    }

    #[tokio::test]
    async fn listing_a_missing_directory_is_an_error() {
        let tree = LocalTree::new();
        assert!(tree.relative_files(Path::new("/nonexistent/tree")).await.is_err());
    }
}
