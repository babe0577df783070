//! Configuration inspection commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use catalog_core::config::AppConfig;
use catalog_core::error::AppError;
use catalog_database::DatabasePool;
use catalog_database::connection::mask_password;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration, password masked
    Show,
    /// Summarize the effective policies and check the database connection
    Check {
        /// Skip the database connection check
        #[arg(long)]
        offline: bool,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = mask_password(&shown.database.url);
            output::print_item(&shown, format);
        }
        ConfigCommand::Check { offline } => {
            output::print_success(&format!("Configuration '{config_path}' loaded"));
            output::print_kv("Database", &mask_password(&config.database.url));
            output::print_kv("Uploads root", &config.uploads.root);
            output::print_kv("Max upload size", &config.uploads.max_size_bytes.to_string());
            output::print_kv("Cover policy", &format!("{:?}", config.catalog.cover_policy));
            output::print_kv(
                "Duplicate assignment",
                &format!("{:?}", config.catalog.duplicate_assignment),
            );
            output::print_kv("Delete policy", &format!("{:?}", config.catalog.delete_policy));
            if !offline {
                check_database(config).await?;
            }
        }
    }

    Ok(())
}

async fn check_database(config: &AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    let healthy = db.health_check().await;
    db.close().await;
    if healthy? {
        output::print_success("Database reachable");
    } else {
        output::print_warning("Database answered the health check unexpectedly");
    }
    Ok(())
}
