//! Directory mirror engine
//!
//! The [`MirrorEngine`] makes a remote directory tree match a local build
//! output tree over the remote-store port.
//!
//! ## Sync Flow
//!
//! 1. **Connect**: open the session (precondition: the local tree exists)
//! 2. **Ensure**: create the configured remote base path if missing
//! 3. **Upload**: depth-first mirror of the local tree, overwrite-always
//! 4. **Prune**: one recursive remote listing, diffed against fresh local
//!    file/directory sets; remote-only entries are deleted unless the
//!    retention policy protects them
//! 5. **Disconnect**: best-effort, in every outcome
//!
//! The passes are strictly sequential on one session; the remote tree is
//! being structurally mutated, so nothing runs concurrently. There is no
//! retry anywhere in this layer: the first failure aborts the run and the
//! operator re-runs the whole tool (upload is idempotent). Cancellation is
//! observed between operations and surfaces as its own error kind.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use webship_core::domain::{DeployError, PathSet, RemotePath, RetentionPolicy};
use webship_core::ports::{ILocalTree, IProgressSink, IRemoteStore, RemoteEntry};

/// Summary of a completed mirror pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Files uploaded (every local file, unconditionally)
    pub files_uploaded: u32,
    /// Remote directories created
    pub directories_created: u32,
    /// Remote-only files deleted
    pub files_deleted: u32,
    /// Remote-only directories deleted
    pub directories_deleted: u32,
    /// Remote-only entries kept by the retention policy
    pub entries_retained: u32,
    /// Wall-clock duration of the sync in milliseconds
    pub duration_ms: u64,
}

/// Mirrors a local tree onto a remote store
///
/// ## Dependencies
///
/// - `remote`: remote tree operations (list, mkdir, upload, delete)
/// - `local`: read-only view of the build output
/// - `retention`: decides which remote-only paths must survive pruning
/// - `progress`: operator-facing reporting
/// - `base`: the remote path all operations are confined to (may be the
///   login root)
///
/// The engine holds the session for the whole run and never shares it.
pub struct MirrorEngine {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalTree>,
    retention: RetentionPolicy,
    progress: Arc<dyn IProgressSink>,
    base: RemotePath,
    cancel: CancellationToken,
}

impl MirrorEngine {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalTree>,
        retention: RetentionPolicy,
        progress: Arc<dyn IProgressSink>,
        base: RemotePath,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            remote,
            local,
            retention,
            progress,
            base,
            cancel,
        }
    }

    fn check_cancelled(&self) -> Result<(), DeployError> {
        if self.cancel.is_cancelled() {
            Err(DeployError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs the full mirror: connect, ensure base, upload, prune,
    /// best-effort disconnect.
    ///
    /// # Errors
    /// [`DeployError::Precondition`] when `local_dir` does not exist (no
    /// network I/O has happened yet), [`DeployError::Transport`] on the
    /// first failed remote operation, [`DeployError::Cancelled`] when the
    /// token fires between operations. Disconnect failures never escalate;
    /// the run's outcome was already decided in the body.
    pub async fn sync(&self, local_dir: &Path) -> Result<MirrorSummary, DeployError> {
        if !self.local.exists(local_dir).await {
            return Err(DeployError::Precondition(format!(
                "local directory '{}' does not exist",
                local_dir.display()
            )));
        }

        self.check_cancelled()?;
        self.remote
            .connect()
            .await
            .map_err(|e| DeployError::transport("connect", e))?;

        let result = self.sync_body(local_dir).await;
        self.disconnect_best_effort().await;
        result
    }

    /// Connects, lists the remote root, and verifies the configured base
    /// path exists. No upload or prune.
    pub async fn test_connection(&self) -> Result<(), DeployError> {
        self.check_cancelled()?;
        self.remote
            .connect()
            .await
            .map_err(|e| DeployError::transport("connect", e))?;

        let result = self.test_connection_body().await;
        self.disconnect_best_effort().await;
        result
    }

    async fn sync_body(&self, local_dir: &Path) -> Result<MirrorSummary, DeployError> {
        let start = Instant::now();
        let mut summary = MirrorSummary::default();

        if !self.base.is_empty() {
            self.ensure_directory(&self.base, &mut summary).await?;
        }

        self.upload_directory(local_dir, &self.base, &mut summary)
            .await?;
        self.prune_missing(local_dir, &mut summary).await?;

        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            uploaded = summary.files_uploaded,
            created = summary.directories_created,
            deleted_files = summary.files_deleted,
            deleted_directories = summary.directories_deleted,
            retained = summary.entries_retained,
            duration_ms = summary.duration_ms,
            "Mirror completed"
        );

        Ok(summary)
    }

    async fn test_connection_body(&self) -> Result<(), DeployError> {
        self.remote
            .list("/")
            .await
            .map_err(|e| DeployError::transport("list remote root", e))?;

        if !self.base.is_empty() {
            let absolute = self.base.to_absolute();
            let exists = self
                .remote
                .directory_exists(&absolute)
                .await
                .map_err(|e| DeployError::transport("check remote directory", e))?;
            if !exists {
                return Err(DeployError::Transport {
                    operation: "check remote directory".to_string(),
                    message: format!(
                        "remote directory '{absolute}' does not exist or is not accessible"
                    ),
                });
            }
        }

        Ok(())
    }

    /// Guarantees `dir` exists remotely, creating missing segments.
    /// Idempotent: a second call with the same path is a no-op.
    async fn ensure_directory(
        &self,
        dir: &RemotePath,
        summary: &mut MirrorSummary,
    ) -> Result<(), DeployError> {
        if dir.is_empty() {
            return Ok(());
        }

        self.check_cancelled()?;
        let absolute = dir.to_absolute();
        let exists = self
            .remote
            .directory_exists(&absolute)
            .await
            .map_err(|e| DeployError::transport("check remote directory", e))?;
        if exists {
            return Ok(());
        }

        self.progress
            .info(&format!("Creating remote directory {absolute}"));
        self.remote
            .create_dir_all(&absolute)
            .await
            .map_err(|e| DeployError::transport("create remote directory", e))?;
        summary.directories_created += 1;
        Ok(())
    }

    /// Depth-first upload of `local_dir` into `remote_dir`. Subdirectories
    /// and their full subtrees are processed before this directory's
    /// files; sibling order follows the local listing. Entries with an
    /// unreadable name are skipped.
    fn upload_directory<'a>(
        &'a self,
        local_dir: &'a Path,
        remote_dir: &'a RemotePath,
        summary: &'a mut MirrorSummary,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<(), DeployError>> + Send + 'a>,
    > {
        Box::pin(async move {
            let subdirectories = self
                .local
                .subdirectories(local_dir)
                .await
                .map_err(|e| DeployError::transport("read local tree", e))?;

            for directory in subdirectories {
                let Some(name) = directory.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.trim().is_empty() {
                    continue;
                }
                let child = remote_dir.join(name);
                self.ensure_directory(&child, summary).await?;
                self.upload_directory(&directory, &child, summary).await?;
            }

            let files = self
                .local
                .files(local_dir)
                .await
                .map_err(|e| DeployError::transport("read local tree", e))?;

            for file in files {
                let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.trim().is_empty() {
                    continue;
                }
                let target = remote_dir.join(name).to_absolute();

                self.check_cancelled()?;
                self.progress
                    .info(&format!("Uploading {} -> {}", file.display(), target));
                self.remote
                    .upload_file(&file, &target)
                    .await
                    .map_err(|e| DeployError::transport("upload", e))?;
                summary.files_uploaded += 1;
            }

            Ok(())
        })
    }

    /// Deletes remote entries with no local counterpart. One recursive
    /// listing; local sets are computed fresh (nothing is cached across
    /// runs). Files first, then remote-only directories deepest-first so
    /// children are removed before their ancestors. The base directory
    /// itself (relative path `""`) is never a candidate.
    async fn prune_missing(
        &self,
        local_dir: &Path,
        summary: &mut MirrorSummary,
    ) -> Result<(), DeployError> {
        self.check_cancelled()?;
        let base_absolute = self.base.to_absolute();
        let listing = self
            .remote
            .list_recursive(&base_absolute)
            .await
            .map_err(|e| DeployError::transport("list remote tree", e))?;

        let local_files: PathSet = self
            .local
            .relative_files(local_dir)
            .await
            .map_err(|e| DeployError::transport("read local tree", e))?
            .into_iter()
            .collect();
        let local_directories: PathSet = self
            .local
            .relative_directories(local_dir)
            .await
            .map_err(|e| DeployError::transport("read local tree", e))?
            .into_iter()
            .collect();

        debug!(
            remote_entries = listing.len(),
            local_files = local_files.len(),
            local_directories = local_directories.len(),
            "Pruning against remote listing"
        );

        for entry in listing.iter().filter(|e| e.is_file()) {
            let relative = self.base.relative_of(&entry.path);
            if relative.is_empty() {
                continue;
            }
            if local_files.contains(&relative) {
                continue;
            }
            if self.retention.should_skip_deletion(&relative) {
                self.progress
                    .skip(&format!("Skipping remote file {} (retention)", entry.path));
                summary.entries_retained += 1;
                continue;
            }

            self.check_cancelled()?;
            self.progress
                .warn(&format!("Deleting remote file {}", entry.path));
            self.remote
                .delete_file(&entry.path)
                .await
                .map_err(|e| DeployError::transport("delete remote file", e))?;
            summary.files_deleted += 1;
        }

        let mut doomed: Vec<(&RemoteEntry, String)> = listing
            .iter()
            .filter(|e| e.is_directory())
            .map(|e| (e, self.base.relative_of(&e.path)))
            .filter(|(_, relative)| {
                !relative.is_empty() && !local_directories.contains(relative)
            })
            .collect();
        // Deepest first, so a parent is never removed while children remain.
        doomed.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        for (entry, relative) in doomed {
            if self.retention.should_skip_deletion(&relative) {
                self.progress.skip(&format!(
                    "Skipping remote directory {} (retention)",
                    entry.path
                ));
                summary.entries_retained += 1;
                continue;
            }

            self.check_cancelled()?;
            self.progress
                .warn(&format!("Deleting remote directory {}", entry.path));
            self.remote
                .delete_dir(&entry.path)
                .await
                .map_err(|e| DeployError::transport("delete remote directory", e))?;
            summary.directories_deleted += 1;
        }

        Ok(())
    }

    async fn disconnect_best_effort(&self) {
        if let Err(err) = self.remote.disconnect().await {
            debug!(error = %format!("{err:#}"), "Ignoring disconnect failure");
        }
    }
}
