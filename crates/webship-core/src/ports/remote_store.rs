//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for mutating the remote directory
//! tree. The primary implementation speaks FTP, but the trait is
//! transport-agnostic; the mirror engine never sees a socket.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific; the engine translates them into `DeployError`
//!   kinds at its single translation boundary.
//! - Every remote path argument is in absolute form (`/`-prefixed), as
//!   produced by `RemotePath::to_absolute`.
//! - The session behind an implementation is owned exclusively by one
//!   sync run for its entire lifetime; implementations are not expected
//!   to support concurrent operations.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Type tag of a listed remote item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteEntryKind {
    File,
    Directory,
}

/// A single item from a remote listing
///
/// Port-level DTO: the absolute path as the server reports it, plus the
/// type tag. The engine derives relative paths from it against the
/// configured base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Absolute remote path of the entry
    pub path: String,
    /// Whether the entry is a file or a directory
    pub kind: RemoteEntryKind,
}

impl RemoteEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: RemoteEntryKind::File,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: RemoteEntryKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == RemoteEntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == RemoteEntryKind::Directory
    }
}

/// Port trait for remote tree operations
///
/// All operations are blocking-until-complete from the engine's point of
/// view; there is no retry at this layer. A failed call is surfaced
/// immediately and ends the run.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Opens the session. Must be called before any other operation.
    async fn connect(&self) -> anyhow::Result<()>;

    /// Closes the session. Callers treat failures as best-effort cleanup.
    async fn disconnect(&self) -> anyhow::Result<()>;

    /// Lists the immediate children of `path`.
    async fn list(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>>;

    /// Lists everything under `path`, depth-first. The entry for `path`
    /// itself is not included.
    async fn list_recursive(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>>;

    /// Reports whether `path` exists and is a directory.
    async fn directory_exists(&self, path: &str) -> anyhow::Result<bool>;

    /// Creates `path` and any missing intermediate segments. Idempotent:
    /// succeeding segments that already exist are not an error.
    async fn create_dir_all(&self, path: &str) -> anyhow::Result<()>;

    /// Uploads `local` to `remote`, replacing any existing file
    /// (last-writer-wins; no existence or verification check).
    async fn upload_file(&self, local: &Path, remote: &str) -> anyhow::Result<()>;

    /// Deletes a single remote file.
    async fn delete_file(&self, path: &str) -> anyhow::Result<()>;

    /// Deletes a single remote directory (non-recursive).
    async fn delete_dir(&self, path: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_constructors_set_kind() {
        let f = RemoteEntry::file("/site/a.txt");
        assert!(f.is_file());
        assert!(!f.is_directory());

        let d = RemoteEntry::directory("/site/css");
        assert!(d.is_directory());
        assert_eq!(d.path, "/site/css");
    }
}
