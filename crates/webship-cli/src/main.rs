//! Webship CLI - Command-line interface for Webship
//!
//! Provides commands for:
//! - Running a full deployment (build, mirror upload, git tag)
//! - Testing the FTP connection and remote base path
//! - Inspecting the effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod deploy;
mod git;
mod output;
mod process;

use commands::{config::ConfigCommand, deploy::DeployCommand, test_connection::TestConnectionCommand};
use output::OutputFormat;
use webship_core::config::Config;

#[derive(Debug, Parser)]
#[command(name = "webship", version, about = "Build, mirror and tag web deployments")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the frontend, mirror it over FTP and tag the release
    Deploy(DeployCommand),
    /// Connect to the FTP server and verify the remote base path
    TestConnection(TestConnectionCommand),
    /// View the effective configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing: -v flags win over the configured level.
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Deploy(cmd) => cmd.execute(config, format, cli.quiet).await,
        Commands::TestConnection(cmd) => cmd.execute(config, format).await,
        Commands::Config(cmd) => cmd.execute(config, &config_path, format).await,
    }
}
