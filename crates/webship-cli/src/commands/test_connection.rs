//! Test-connection command - verify FTP settings without deploying
//!
//! Connects, lists the server root and checks the configured remote base
//! path. Performs no upload or prune.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use webship_core::config::Config;
use webship_core::domain::DeployError;

use crate::deploy::DeployService;
use crate::output::{get_formatter, ConsoleProgress, OutputFormat};

#[derive(Debug, Args)]
pub struct TestConnectionCommand {}

impl TestConnectionCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let json = matches!(format, OutputFormat::Json);
        let formatter = get_formatter(json);

        // Only the FTP section matters here; a missing frontend path must
        // not block a connection test.
        let ftp_errors: Vec<_> = config
            .validate()
            .into_iter()
            .filter(|e| e.field.starts_with("ftp."))
            .collect();
        if !ftp_errors.is_empty() {
            formatter.error("Configuration errors:");
            for error in &ftp_errors {
                formatter.error(&format!("- {error}"));
            }
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_token.cancel();
            }
        });

        let progress = Arc::new(ConsoleProgress::new(json, false));
        let service = DeployService::new(config, progress, cancel);

        formatter.info("Testing FTP connection...");
        match service.test_connection().await {
            Ok(()) => {
                formatter.success("Connection test completed successfully");
                Ok(())
            }
            Err(err) => {
                if matches!(err.downcast_ref::<DeployError>(), Some(DeployError::Cancelled)) {
                    formatter.warn("Connection test cancelled");
                } else {
                    formatter.error(&format!("Connection test failed: {err:#}"));
                }
                Ok(())
            }
        }
    }
}
