//! Local tree port (driven/secondary port)
//!
//! Read-only view of the local build output. The reconciliation algorithm
//! is deliberately decoupled from any particular traversal primitive: the
//! uploader walks immediate children, and the pruner consumes flat
//! normalized-relative-path listings. That split keeps the engine
//! testable against an in-memory tree.

use std::path::{Path, PathBuf};

/// Port trait for reading the local build output tree
///
/// Relative listings use the canonical slash form (`/` separators, no
/// leading or trailing slash) regardless of the platform separator.
#[async_trait::async_trait]
pub trait ILocalTree: Send + Sync {
    /// Reports whether `dir` exists and is a directory.
    async fn exists(&self, dir: &Path) -> bool;

    /// Immediate subdirectories of `dir`, in directory listing order.
    async fn subdirectories(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>>;

    /// Immediate regular files of `dir`, in directory listing order.
    async fn files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>>;

    /// Every file under `root`, as normalized paths relative to `root`.
    async fn relative_files(&self, root: &Path) -> anyhow::Result<Vec<String>>;

    /// Every directory under `root` (excluding `root` itself), as
    /// normalized paths relative to `root`.
    async fn relative_directories(&self, root: &Path) -> anyhow::Result<Vec<String>>;
}
