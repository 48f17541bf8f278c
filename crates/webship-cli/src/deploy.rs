//! Deployment service
//!
//! Sequential pipeline: validate configuration, build the frontend, bundle
//! the backend into the build output, mirror the result over FTP, tag the
//! release. Any failed step aborts the pipeline; a failed build means no
//! network activity happens at all.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use webship_core::config::Config;
use webship_core::domain::{DeployError, RemotePath, RetentionPolicy};
use webship_core::ports::IProgressSink;
use webship_ftp::FtpRemoteStore;
use webship_sync::{LocalTree, MirrorEngine, MirrorSummary};

use crate::git;
use crate::process::{split_command, ProcessRunner};

/// Orchestrates one deployment run
pub struct DeployService {
    config: Config,
    progress: Arc<dyn IProgressSink>,
    runner: ProcessRunner,
    cancel: CancellationToken,
}

/// Flags for skipping pipeline steps
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    pub skip_build: bool,
    pub skip_tag: bool,
}

impl DeployService {
    pub fn new(config: Config, progress: Arc<dyn IProgressSink>, cancel: CancellationToken) -> Self {
        Self {
            config,
            progress,
            runner: ProcessRunner::new(),
            cancel,
        }
    }

    /// Runs the full pipeline and returns the mirror summary.
    pub async fn run(&self, options: DeployOptions) -> Result<MirrorSummary> {
        let errors = self.config.validate();
        if !errors.is_empty() {
            self.progress.error("Configuration errors:");
            for error in &errors {
                self.progress.error(&format!("- {error}"));
            }
            return Err(
                DeployError::Precondition("deployment configuration is invalid".to_string()).into(),
            );
        }

        let frontend = self.resolve_frontend_path()?;
        let build_output = frontend.join(&self.config.build.output_subdir);

        self.progress
            .info(&format!("Frontend path: {}", frontend.display()));
        self.progress
            .info(&format!("Build output path: {}", build_output.display()));

        if options.skip_build {
            self.progress.info("Skipping frontend build");
        } else {
            self.build_frontend(&frontend).await?;
        }

        if !build_output.is_dir() {
            return Err(DeployError::Precondition(format!(
                "build output path '{}' does not exist after build",
                build_output.display()
            ))
            .into());
        }

        if let Some(backend) = self.config.backend.path.clone() {
            self.bundle_backend(&backend, &build_output)?;
        }

        self.progress.info("Uploading build output...");
        let summary = self.sync(&build_output).await?;

        if options.skip_tag {
            self.progress.info("Skipping git tag");
        } else if self.config.git.tag_on_deploy {
            self.create_git_tag().await?;
        }

        info!("Deployment completed");
        Ok(summary)
    }

    fn resolve_frontend_path(&self) -> Result<PathBuf> {
        // validate() already guarantees the field is set.
        let configured = self
            .config
            .build
            .frontend_path
            .as_ref()
            .ok_or_else(|| DeployError::Precondition("frontend path is not configured".into()))?;
        if !configured.is_dir() {
            return Err(DeployError::Precondition(format!(
                "configured frontend path '{}' does not exist",
                configured.display()
            ))
            .into());
        }
        Ok(configured.clone())
    }

    async fn build_frontend(&self, frontend: &Path) -> Result<()> {
        let command = &self.config.build.command;
        let (program, args) = split_command(command)
            .ok_or_else(|| DeployError::Precondition("build command is empty".into()))?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        self.progress
            .info(&format!("Building frontend ({command})..."));
        self.runner
            .run(&program, &args, frontend, &self.cancel)
            .await
    }

    fn bundle_backend(&self, backend: &Path, build_output: &Path) -> Result<()> {
        if !backend.is_dir() {
            return Err(DeployError::Precondition(format!(
                "configured backend path '{}' does not exist",
                backend.display()
            ))
            .into());
        }

        let destination = build_output.join(&self.config.backend.remote_subdir);
        self.progress.info(&format!(
            "Copying backend files to '{}'...",
            destination.display()
        ));

        if destination.exists() {
            std::fs::remove_dir_all(&destination).with_context(|| {
                format!("removing previous backend copy '{}'", destination.display())
            })?;
        }
        copy_directory(backend, &destination)
    }

    async fn sync(&self, build_output: &Path) -> Result<MirrorSummary> {
        let remote = Arc::new(FtpRemoteStore::new(self.config.ftp.clone()));
        let engine = MirrorEngine::new(
            remote,
            Arc::new(LocalTree::new()),
            RetentionPolicy::from_config(&self.config.retention),
            Arc::clone(&self.progress),
            RemotePath::new(&self.config.ftp.remote_base_path),
            self.cancel.clone(),
        );
        Ok(engine.sync(build_output).await?)
    }

    /// Builds an engine for the connection test; no upload or prune runs.
    pub async fn test_connection(&self) -> Result<()> {
        let remote = Arc::new(FtpRemoteStore::new(self.config.ftp.clone()));
        let engine = MirrorEngine::new(
            remote,
            Arc::new(LocalTree::new()),
            RetentionPolicy::from_config(&self.config.retention),
            Arc::clone(&self.progress),
            RemotePath::new(&self.config.ftp.remote_base_path),
            self.cancel.clone(),
        );
        Ok(engine.test_connection().await?)
    }

    async fn create_git_tag(&self) -> Result<()> {
        let repository =
            match git::resolve_repository_path(self.config.git.repository_path.as_deref()) {
                Some(path) => path,
                None => {
                    self.progress
                        .info("Git repository not found. Skipping tag creation.");
                    return Ok(());
                }
            };

        self.progress
            .info(&format!("Git repository path: {}", repository.display()));
        git::create_and_push_tag(
            &self.runner,
            &repository,
            &self.config.git.tag_prefix,
            self.progress.as_ref(),
            &self.cancel,
        )
        .await
    }
}

/// Copies `source` into `destination` recursively, creating directories
/// first and overwriting existing files.
pub fn copy_directory(source: &Path, destination: &Path) -> Result<()> {
    std::fs::create_dir_all(destination)
        .with_context(|| format!("creating '{}'", destination.display()))?;

    for entry in std::fs::read_dir(source)
        .with_context(|| format!("reading '{}'", source.display()))?
    {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_directory(&entry.path(), &target)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("copying '{}'", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_directory_replicates_the_tree() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("config")).unwrap();
        std::fs::write(source.path().join("index.php"), b"<?php").unwrap();
        std::fs::write(source.path().join("config/app.php"), b"<?php").unwrap();

        let destination = tempfile::tempdir().unwrap();
        let target = destination.path().join("server");
        copy_directory(source.path(), &target).unwrap();

        assert!(target.join("index.php").is_file());
        assert!(target.join("config/app.php").is_file());
    }

    #[test]
    fn copy_directory_overwrites_existing_files() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), b"new").unwrap();

        let destination = tempfile::tempdir().unwrap();
        std::fs::write(destination.path().join("a.txt"), b"old").unwrap();

        copy_directory(source.path(), destination.path()).unwrap();
        assert_eq!(
            std::fs::read(destination.path().join("a.txt")).unwrap(),
            b"new"
        );
    }
}
