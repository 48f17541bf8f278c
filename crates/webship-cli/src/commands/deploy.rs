//! Deploy command - run the full deployment pipeline
//!
//! Wires up the console progress sink and the Ctrl-C cancellation token,
//! runs the deployment service, and renders the mirror summary.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use webship_core::config::Config;
use webship_core::domain::DeployError;

use crate::deploy::{DeployOptions, DeployService};
use crate::output::{get_formatter, ConsoleProgress, OutputFormat};

#[derive(Debug, Args)]
pub struct DeployCommand {
    /// Skip the frontend build step (mirror the existing build output)
    #[arg(long)]
    pub skip_build: bool,

    /// Skip git tag creation even when enabled in the configuration
    #[arg(long)]
    pub skip_tag: bool,
}

impl DeployCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat, quiet: bool) -> Result<()> {
        let json = matches!(format, OutputFormat::Json);
        let formatter = get_formatter(json);
        let progress = Arc::new(ConsoleProgress::new(json, quiet));

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_token.cancel();
            }
        });

        let service = DeployService::new(config, progress, cancel);
        let options = DeployOptions {
            skip_build: self.skip_build,
            skip_tag: self.skip_tag,
        };

        match service.run(options).await {
            Ok(summary) => {
                if json {
                    formatter.print_json(&serde_json::json!({
                        "files_uploaded": summary.files_uploaded,
                        "directories_created": summary.directories_created,
                        "files_deleted": summary.files_deleted,
                        "directories_deleted": summary.directories_deleted,
                        "entries_retained": summary.entries_retained,
                        "duration_ms": summary.duration_ms,
                    }));
                } else {
                    let duration_display = if summary.duration_ms >= 1000 {
                        format!("{:.1}s", summary.duration_ms as f64 / 1000.0)
                    } else {
                        format!("{}ms", summary.duration_ms)
                    };
                    formatter.success(&format!(
                        "Deployment completed successfully in {duration_display}"
                    ));
                    formatter.info(&format!("Uploaded:  {} files", summary.files_uploaded));
                    if summary.files_deleted > 0 || summary.directories_deleted > 0 {
                        formatter.info(&format!(
                            "Deleted:   {} files, {} directories",
                            summary.files_deleted, summary.directories_deleted
                        ));
                    }
                    if summary.entries_retained > 0 {
                        formatter.info(&format!(
                            "Retained:  {} entries (retention policy)",
                            summary.entries_retained
                        ));
                    }
                }
                Ok(())
            }
            Err(err) => {
                if matches!(err.downcast_ref::<DeployError>(), Some(DeployError::Cancelled)) {
                    formatter.warn("Deployment cancelled");
                    return Ok(());
                }
                Err(err)
            }
        }
    }
}
