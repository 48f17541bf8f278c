//! Config command - inspect the effective configuration
//!
//! Prints the merged configuration (file plus environment overrides) with
//! the FTP password redacted, or just the config file path.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use webship_core::config::Config;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Print the config file path instead of the contents
    #[arg(long)]
    pub path: bool,
}

impl ConfigCommand {
    pub async fn execute(
        &self,
        config: Config,
        config_path: &Path,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        if self.path {
            println!("{}", config_path.display());
            return Ok(());
        }

        let mut redacted = config;
        if !redacted.ftp.password.is_empty() {
            redacted.ftp.password = "<redacted>".to_string();
        }

        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::to_value(&redacted)?);
        } else {
            print!("{}", serde_yaml::to_string(&redacted)?);
        }
        Ok(())
    }
}
