//! CLI command definitions and dispatch.

pub mod category;
pub mod config;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use catalog_core::config::AppConfig;
use catalog_core::error::AppError;
use catalog_database::DatabasePool;
use catalog_service::{Catalog, LocalFileProcessor};

/// Catalog administration: category trees, assignments and attachments
#[derive(Debug, Parser)]
#[command(name = "catalog", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Category management
    Category(category::CategoryArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Category(args) => category::execute(args, &config, self.format).await,
            Commands::Config(args) => {
                config::execute(args, &self.config, &config, self.format).await
            }
        }
    }
}

/// Services over the configured database and upload root.
pub async fn connect_catalog(config: &AppConfig) -> Result<(DatabasePool, Catalog), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    let processor = LocalFileProcessor::new(&config.uploads.root).await?;
    let catalog = Catalog::postgres(&db, Arc::new(processor), config);
    Ok((db, catalog))
}
