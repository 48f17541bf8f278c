//! FTP implementation of the remote store port
//!
//! The `ftp` client is synchronous, so every port method moves its work
//! onto the blocking pool with `spawn_blocking`. The session lives behind
//! a mutex purely to satisfy `Send + Sync`; the engine serializes all
//! operations, so the lock is never contended.
//!
//! FTP has no typed directory listing that is portable across servers, so
//! listings combine `NLST` with a `CWD` probe: an entry we can change into
//! is a directory, anything else is a file. This stays correct for names
//! containing spaces and for servers that return either bare names or
//! absolute paths.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use ftp::types::FileType;
use ftp::FtpStream;
use tracing::{debug, warn};

use webship_core::config::FtpConfig;
use webship_core::ports::{IRemoteStore, RemoteEntry};

/// Remote store over a blocking FTP session
pub struct FtpRemoteStore {
    settings: FtpConfig,
    stream: Arc<Mutex<Option<FtpStream>>>,
}

impl FtpRemoteStore {
    pub fn new(settings: FtpConfig) -> Self {
        Self {
            settings,
            stream: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs `operation` against the connected session on the blocking pool.
    async fn with_session<T, F>(&self, operation: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> anyhow::Result<T> + Send + 'static,
    {
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || {
            let mut guard = stream
                .lock()
                .map_err(|_| anyhow!("ftp session mutex poisoned"))?;
            let session = guard
                .as_mut()
                .ok_or_else(|| anyhow!("not connected"))?;
            operation(session)
        })
        .await
        .map_err(|e| anyhow!("blocking ftp task failed: {e}"))?
    }
}

fn ftp_err(err: ftp::FtpError) -> anyhow::Error {
    anyhow!("{err}")
}

/// Joins an absolute parent with a child name, keeping a single `/`.
fn join_remote(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Extracts the entry name from an `NLST` line. Servers return either bare
/// names or full paths; `.` and `..` are dropped.
fn entry_name(listed: &str) -> Option<String> {
    let name = listed.trim().rsplit('/').next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// The chain of absolute ancestors to create for `path`, shallow to deep:
/// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`.
fn ancestor_chain(path: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut partial = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        partial.push('/');
        partial.push_str(segment);
        chain.push(partial.clone());
    }
    chain
}

/// Probes whether `path` is a directory we can change into, restoring the
/// working directory afterwards.
fn probe_directory(session: &mut FtpStream, path: &str) -> anyhow::Result<bool> {
    let origin = session.pwd().map_err(ftp_err).context("PWD")?;
    match session.cwd(path) {
        Ok(()) => {
            session
                .cwd(&origin)
                .map_err(ftp_err)
                .with_context(|| format!("CWD back to {origin}"))?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

fn list_directory(session: &mut FtpStream, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
    let names = session
        .nlst(Some(path))
        .map_err(ftp_err)
        .with_context(|| format!("NLST {path}"))?;

    let mut entries = Vec::new();
    for listed in names {
        let Some(name) = entry_name(&listed) else {
            continue;
        };
        let full = join_remote(path, &name);
        if probe_directory(session, &full)? {
            entries.push(RemoteEntry::directory(full));
        } else {
            entries.push(RemoteEntry::file(full));
        }
    }
    Ok(entries)
}

fn list_tree(
    session: &mut FtpStream,
    path: &str,
    out: &mut Vec<RemoteEntry>,
) -> anyhow::Result<()> {
    for entry in list_directory(session, path)? {
        let descend = entry.is_directory().then(|| entry.path.clone());
        out.push(entry);
        if let Some(child) = descend {
            list_tree(session, &child, out)?;
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl IRemoteStore for FtpRemoteStore {
    async fn connect(&self) -> anyhow::Result<()> {
        if !self.settings.passive {
            // The transport only opens PASV data connections.
            warn!("active FTP mode is not supported; using passive data connections");
        }

        let settings = self.settings.clone();
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut session = FtpStream::connect((settings.host.as_str(), settings.port))
                .map_err(ftp_err)
                .with_context(|| {
                    format!("connecting to {}:{}", settings.host, settings.port)
                })?;
            session
                .login(&settings.username, &settings.password)
                .map_err(ftp_err)
                .with_context(|| format!("logging in as {}", settings.username))?;
            session
                .transfer_type(FileType::Binary)
                .map_err(ftp_err)
                .context("setting binary transfer type")?;

            debug!(host = %settings.host, port = settings.port, "FTP session established");

            let mut guard = stream
                .lock()
                .map_err(|_| anyhow!("ftp session mutex poisoned"))?;
            *guard = Some(session);
            Ok(())
        })
        .await
        .map_err(|e| anyhow!("blocking ftp task failed: {e}"))?
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut guard = stream
                .lock()
                .map_err(|_| anyhow!("ftp session mutex poisoned"))?;
            if let Some(mut session) = guard.take() {
                session.quit().map_err(ftp_err).context("QUIT")?;
            }
            Ok(())
        })
        .await
        .map_err(|e| anyhow!("blocking ftp task failed: {e}"))?
    }

    async fn list(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let path = path.to_string();
        self.with_session(move |session| list_directory(session, &path))
            .await
    }

    async fn list_recursive(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let path = path.to_string();
        self.with_session(move |session| {
            let mut entries = Vec::new();
            list_tree(session, &path, &mut entries)?;
            Ok(entries)
        })
        .await
    }

    async fn directory_exists(&self, path: &str) -> anyhow::Result<bool> {
        let path = path.to_string();
        self.with_session(move |session| probe_directory(session, &path))
            .await
    }

    async fn create_dir_all(&self, path: &str) -> anyhow::Result<()> {
        let path = path.to_string();
        self.with_session(move |session| {
            for partial in ancestor_chain(&path) {
                if probe_directory(session, &partial)? {
                    continue;
                }
                session
                    .mkdir(&partial)
                    .map_err(ftp_err)
                    .with_context(|| format!("MKD {partial}"))?;
            }
            Ok(())
        })
        .await
    }

    async fn upload_file(&self, local: &Path, remote: &str) -> anyhow::Result<()> {
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();
        self.with_session(move |session| {
            let mut file = std::fs::File::open(&local)
                .with_context(|| format!("opening {}", local.display()))?;
            session
                .put(&remote, &mut file)
                .map_err(ftp_err)
                .with_context(|| format!("STOR {remote}"))?;
            Ok(())
        })
        .await
    }

    async fn delete_file(&self, path: &str) -> anyhow::Result<()> {
        let path = path.to_string();
        self.with_session(move |session| {
            session
                .rm(&path)
                .map_err(ftp_err)
                .with_context(|| format!("DELE {path}"))
        })
        .await
    }

    async fn delete_dir(&self, path: &str) -> anyhow::Result<()> {
        let path = path.to_string();
        self.with_session(move |session| {
            session
                .rmdir(&path)
                .map_err(ftp_err)
                .with_context(|| format!("RMD {path}"))
        })
        .await
    }
}
