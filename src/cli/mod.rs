//! # Command Line Interface
//!
//! `flyway-migrator --config base.yaml --config prod.yaml` merges the files,
//! validates the result and migrates every schema.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::config::{display_paths, RunnerSettings};
use crate::migrator::Migrator;
use crate::observability::{init_logging, LoggingOptions};

#[derive(Parser, Debug)]
#[command(name = "flyway-migrator")]
#[command(about = "Run Flyway migrations for every schema in a configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file; repeat to deep-merge several files in order
    #[arg(short, long = "config", value_name = "FILE", required = true)]
    pub configs: Vec<PathBuf>,

    /// Validate the configuration and resolve credentials without migrating
    #[arg(long)]
    pub validate_only: bool,

    /// Flyway executable (overrides FLYWAY_MIGRATOR_FLYWAY_COMMAND)
    #[arg(long, value_name = "CMD")]
    pub flyway_command: Option<String>,

    /// Secret store timeout in seconds (overrides FLYWAY_MIGRATOR_SECRETS_TIMEOUT_SECS)
    #[arg(long, value_name = "N")]
    pub secrets_timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingOptions { verbose: cli.verbose, json: cli.log_json });
    run(cli).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = RunnerSettings::from_env()?
        .with_overrides(cli.flyway_command.clone(), cli.secrets_timeout_secs)?;

    info!(
        configs = %display_paths(&cli.configs),
        flyway_command = %settings.flyway_command,
        secrets_timeout_secs = settings.secrets_timeout_secs,
        "Loading migrator configuration"
    );

    let mut migrator = Migrator::from_files(&cli.configs)?.with_settings(settings);

    if cli.validate_only {
        migrator.validate().await?;
        println!("Configuration is valid. Schemas to migrate:");
        for schema in &migrator.schemas {
            println!("  {:<30} {}", schema.name, schema.migrations_path);
        }
        return Ok(());
    }

    migrator.migrate().await?;
    Ok(())
}
