//! Mirror engine scenarios against an in-memory remote store.
//!
//! The fake store keeps the remote tree in plain sets, records every
//! operation in order, and can be told to fail a specific operation. The
//! local side is a real temporary directory walked through the production
//! filesystem adapter.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;

use webship_core::domain::{DeployError, RemotePath, RetentionPolicy};
use webship_core::ports::{IRemoteStore, NullProgress, RemoteEntry};
use webship_sync::{LocalTree, MirrorEngine};

#[derive(Default)]
struct RemoteState {
    connected: bool,
    dirs: BTreeSet<String>,
    files: BTreeSet<String>,
    ops: Vec<String>,
    fail_op: Option<&'static str>,
    include_base_in_listing: bool,
}

/// In-memory `IRemoteStore` with an operation log and failure injection.
#[derive(Default)]
struct FakeRemoteStore {
    state: Mutex<RemoteState>,
}

fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

fn is_under(entry: &str, base: &str) -> bool {
    if base == "/" {
        return true;
    }
    entry.starts_with(&format!("{base}/"))
}

impl FakeRemoteStore {
    fn new() -> Self {
        Self::default()
    }

    fn with_tree(dirs: &[&str], files: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.dirs = dirs.iter().map(|d| d.to_string()).collect();
            state.files = files.iter().map(|f| f.to_string()).collect();
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    fn fail_on(&self, op: &'static str) {
        self.lock().fail_op = Some(op);
    }

    fn include_base_in_listing(&self) {
        self.lock().include_base_in_listing = true;
    }

    fn ops(&self) -> Vec<String> {
        self.lock().ops.clone()
    }

    fn dirs(&self) -> Vec<String> {
        self.lock().dirs.iter().cloned().collect()
    }

    fn files(&self) -> Vec<String> {
        self.lock().files.iter().cloned().collect()
    }

    fn op_count(&self, prefix: &str) -> usize {
        self.lock()
            .ops
            .iter()
            .filter(|op| op.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl IRemoteStore for FakeRemoteStore {
    async fn connect(&self) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_op == Some("connect") {
            return Err(anyhow!("connection refused"));
        }
        state.connected = true;
        state.ops.push("connect".to_string());
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.ops.push("disconnect".to_string());
        state.connected = false;
        if state.fail_op == Some("disconnect") {
            return Err(anyhow!("QUIT failed"));
        }
        Ok(())
    }

    async fn list(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("list {path}"));
        let mut entries: Vec<RemoteEntry> = state
            .dirs
            .iter()
            .filter(|d| parent(d) == path)
            .map(|d| RemoteEntry::directory(d.as_str()))
            .collect();
        entries.extend(
            state
                .files
                .iter()
                .filter(|f| parent(f) == path)
                .map(|f| RemoteEntry::file(f.as_str())),
        );
        Ok(entries)
    }

    async fn list_recursive(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("list_recursive {path}"));
        let mut entries = Vec::new();
        if state.include_base_in_listing && state.dirs.contains(path) {
            entries.push(RemoteEntry::directory(path));
        }
        // Shallow-to-deep order: the engine must not rely on the server's
        // ordering when it deletes.
        entries.extend(
            state
                .dirs
                .iter()
                .filter(|d| is_under(d, path))
                .map(|d| RemoteEntry::directory(d.as_str())),
        );
        entries.extend(
            state
                .files
                .iter()
                .filter(|f| is_under(f, path))
                .map(|f| RemoteEntry::file(f.as_str())),
        );
        Ok(entries)
    }

    async fn directory_exists(&self, path: &str) -> anyhow::Result<bool> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("exists {path}"));
        Ok(state.dirs.contains(path))
    }

    async fn create_dir_all(&self, path: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("create_dir_all {path}"));
        if state.fail_op == Some("create_dir_all") {
            return Err(anyhow!("MKD failed"));
        }
        let mut partial = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            partial.push('/');
            partial.push_str(segment);
            state.dirs.insert(partial.clone());
        }
        Ok(())
    }

    async fn upload_file(&self, _local: &Path, remote: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("upload {remote}"));
        if state.fail_op == Some("upload") {
            return Err(anyhow!("STOR failed"));
        }
        let target_parent = parent(remote);
        if target_parent != "/" && !state.dirs.contains(&target_parent) {
            return Err(anyhow!("no such directory: {target_parent}"));
        }
        state.files.insert(remote.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("delete_file {path}"));
        if state.fail_op == Some("delete_file") {
            return Err(anyhow!("550 permission denied"));
        }
        if !state.files.remove(path) {
            return Err(anyhow!("no such file: {path}"));
        }
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(anyhow!("not connected"));
        }
        state.ops.push(format!("delete_dir {path}"));
        if state.fail_op == Some("delete_dir") {
            return Err(anyhow!("550 permission denied"));
        }
        let occupied = state.dirs.iter().any(|d| is_under(d, path))
            || state.files.iter().any(|f| is_under(f, path));
        if occupied {
            return Err(anyhow!("directory not empty: {path}"));
        }
        if !state.dirs.remove(path) {
            return Err(anyhow!("no such directory: {path}"));
        }
        Ok(())
    }
}

fn write_local(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(path, b"content").unwrap();
    }
}

fn engine_with(
    remote: &Arc<FakeRemoteStore>,
    base: &str,
    cancel: CancellationToken,
) -> MirrorEngine {
    MirrorEngine::new(
        Arc::clone(remote) as Arc<dyn IRemoteStore>,
        Arc::new(LocalTree::new()),
        RetentionPolicy::default(),
        Arc::new(NullProgress),
        RemotePath::new(base),
        cancel,
    )
}

fn engine(remote: &Arc<FakeRemoteStore>, base: &str) -> MirrorEngine {
    engine_with(remote, base, CancellationToken::new())
}

#[tokio::test]
async fn mirror_uploads_local_tree_and_prunes_remote_leftovers() {
    let local = tempfile::tempdir().unwrap();
    write_local(local.path(), &["a.txt", "sub/b.txt"]);

    let remote = Arc::new(FakeRemoteStore::with_tree(
        &["/site", "/site/sub", "/site/logs", "/site/stale"],
        &[
            "/site/a.txt",
            "/site/sub/b.txt",
            "/site/old.txt",
            "/site/logs/app.log",
        ],
    ));

    let summary = engine(&remote, "site").sync(local.path()).await.unwrap();

    let files = remote.files();
    assert!(files.contains(&"/site/a.txt".to_string()));
    assert!(files.contains(&"/site/sub/b.txt".to_string()));
    assert!(files.contains(&"/site/logs/app.log".to_string()), "retained log deleted");
    assert!(!files.contains(&"/site/old.txt".to_string()), "stale file survived");

    let dirs = remote.dirs();
    assert!(dirs.contains(&"/site/logs".to_string()));
    assert!(!dirs.contains(&"/site/stale".to_string()), "stale directory survived");

    // Overwrite-always: both files re-uploaded even though present remotely.
    assert_eq!(remote.op_count("upload"), 2);
    assert_eq!(summary.files_uploaded, 2);
    assert_eq!(summary.files_deleted, 1);
    assert_eq!(summary.directories_deleted, 1);
    // app.log and the logs directory.
    assert_eq!(summary.entries_retained, 2);
}

#[tokio::test]
async fn first_deploy_creates_the_remote_structure() {
    let local = tempfile::tempdir().unwrap();
    write_local(
        local.path(),
        &["index.html", "assets/app.js", "assets/css/app.css"],
    );

    let remote = Arc::new(FakeRemoteStore::new());
    let summary = engine(&remote, "site").sync(local.path()).await.unwrap();

    let dirs = remote.dirs();
    assert!(dirs.contains(&"/site".to_string()));
    assert!(dirs.contains(&"/site/assets".to_string()));
    assert!(dirs.contains(&"/site/assets/css".to_string()));
    assert_eq!(remote.files().len(), 3);
    assert_eq!(summary.directories_created, 3);
    assert_eq!(summary.files_uploaded, 3);
}

#[tokio::test]
async fn remote_only_directories_are_deleted_deepest_first() {
    let local = tempfile::tempdir().unwrap();

    let remote = Arc::new(FakeRemoteStore::with_tree(
        &["/site", "/site/a", "/site/a/b", "/site/a/b/c"],
        &[],
    ));

    engine(&remote, "site").sync(local.path()).await.unwrap();

    let deletes: Vec<String> = remote
        .ops()
        .into_iter()
        .filter(|op| op.starts_with("delete_dir"))
        .collect();
    assert_eq!(
        deletes,
        vec![
            "delete_dir /site/a/b/c",
            "delete_dir /site/a/b",
            "delete_dir /site/a",
        ]
    );
    assert!(remote.dirs().contains(&"/site".to_string()));
}

#[tokio::test]
async fn base_directory_itself_is_never_a_deletion_candidate() {
    let local = tempfile::tempdir().unwrap();

    // Simulate a server that reports the base directory in its own listing.
    let remote = Arc::new(FakeRemoteStore::with_tree(&["/site"], &[]));
    remote.include_base_in_listing();

    engine(&remote, "site").sync(local.path()).await.unwrap();

    assert!(remote.dirs().contains(&"/site".to_string()));
    assert_eq!(remote.op_count("delete_dir"), 0);
}

#[tokio::test]
async fn rerunning_an_unchanged_tree_is_idempotent() {
    let local = tempfile::tempdir().unwrap();
    write_local(local.path(), &["a.txt", "sub/b.txt"]);

    let remote = Arc::new(FakeRemoteStore::new());
    let engine = engine(&remote, "site");

    engine.sync(local.path()).await.unwrap();
    let dirs_after_first = remote.dirs();
    let files_after_first = remote.files();
    let ops_after_first = remote.ops().len();

    engine.sync(local.path()).await.unwrap();

    assert_eq!(remote.dirs(), dirs_after_first);
    assert_eq!(remote.files(), files_after_first);

    let second_run_ops: Vec<String> = remote.ops().split_off(ops_after_first);
    assert!(second_run_ops.iter().all(|op| !op.starts_with("delete_")));
    assert!(second_run_ops
        .iter()
        .all(|op| !op.starts_with("create_dir_all")));
    // Files are still re-uploaded; that is the overwrite-always contract.
    assert_eq!(
        second_run_ops
            .iter()
            .filter(|op| op.starts_with("upload"))
            .count(),
        2
    );
}

#[tokio::test]
async fn a_failed_delete_aborts_the_prune_immediately() {
    let local = tempfile::tempdir().unwrap();

    let remote = Arc::new(FakeRemoteStore::with_tree(
        &["/site", "/site/stale"],
        &["/site/old1.txt", "/site/old2.txt"],
    ));
    remote.fail_on("delete_file");

    let err = engine(&remote, "site").sync(local.path()).await.unwrap_err();
    match err {
        DeployError::Transport { operation, message } => {
            assert_eq!(operation, "delete remote file");
            assert!(message.contains("550"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }

    // Fail-fast: exactly one delete attempted, nothing after it.
    assert_eq!(remote.op_count("delete_file"), 1);
    assert_eq!(remote.op_count("delete_dir"), 0);
    // The best-effort disconnect still ran.
    assert_eq!(remote.ops().last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn disconnect_failures_never_escalate() {
    let local = tempfile::tempdir().unwrap();
    write_local(local.path(), &["a.txt"]);

    let remote = Arc::new(FakeRemoteStore::with_tree(&["/site"], &[]));
    remote.fail_on("disconnect");

    let summary = engine(&remote, "site").sync(local.path()).await.unwrap();
    assert_eq!(summary.files_uploaded, 1);
}

#[tokio::test]
async fn cancellation_surfaces_as_its_own_kind() {
    let local = tempfile::tempdir().unwrap();
    write_local(local.path(), &["a.txt"]);

    let remote = Arc::new(FakeRemoteStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine_with(&remote, "site", cancel)
        .sync(local.path())
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    // Cancellation was observed before any network I/O.
    assert!(remote.ops().is_empty());
}

#[tokio::test]
async fn missing_local_directory_is_a_precondition_failure() {
    let remote = Arc::new(FakeRemoteStore::new());

    let err = engine(&remote, "site")
        .sync(Path::new("/nonexistent/build/output"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Precondition(_)));
    assert!(remote.ops().is_empty());
}

#[tokio::test]
async fn empty_base_mirrors_at_the_login_root() {
    let local = tempfile::tempdir().unwrap();
    write_local(local.path(), &["a.txt"]);

    let remote = Arc::new(FakeRemoteStore::with_tree(&[], &["/stale.txt"]));

    engine(&remote, "").sync(local.path()).await.unwrap();

    let files = remote.files();
    assert!(files.contains(&"/a.txt".to_string()));
    assert!(!files.contains(&"/stale.txt".to_string()));
}

#[tokio::test]
async fn test_connection_checks_root_and_base() {
    let remote = Arc::new(FakeRemoteStore::with_tree(&["/site"], &[]));

    engine(&remote, "site").test_connection().await.unwrap();

    let ops = remote.ops();
    assert!(ops.contains(&"list /".to_string()));
    assert!(ops.contains(&"exists /site".to_string()));
    assert_eq!(ops.last().map(String::as_str), Some("disconnect"));
    // No mutation of any kind.
    assert_eq!(remote.op_count("upload"), 0);
    assert_eq!(remote.op_count("delete_"), 0);
    assert_eq!(remote.op_count("create_dir_all"), 0);
}

#[tokio::test]
async fn test_connection_fails_when_the_base_is_missing() {
    let remote = Arc::new(FakeRemoteStore::new());

    let err = engine(&remote, "site").test_connection().await.unwrap_err();
    assert!(matches!(err, DeployError::Transport { .. }));
    assert_eq!(remote.ops().last().map(String::as_str), Some("disconnect"));
}
