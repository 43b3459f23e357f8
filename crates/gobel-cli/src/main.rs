//! Gobel CLI - Main entry point

use clap::Parser;
use gobel_cli::{Cli, Commands};
use gobel_common::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Load .env if present; ignore a missing file
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Quiet console by default; --verbose turns on debug logging
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    // Environment variables configure format, filters and file output; an
    // explicit LOG_LEVEL overrides the flag
    let log_config = match LogConfig::from_env() {
        Ok(mut config) => {
            if std::env::var_os("LOG_LEVEL").is_none() {
                config.level = level;
            }
            config
        },
        Err(_) => LogConfig::builder()
            .level(level)
            .log_file_prefix("gobel".to_string())
            .build(),
    };

    // Initialize logging (ignore errors as CLI should work without logging)
    let _ = init_logging(&log_config);

    // Execute command
    let result = execute_command(&cli).await;

    // Handle result
    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> gobel_cli::Result<()> {
    let database_url = cli.database_url.clone();

    match &cli.command {
        Commands::Populate {
            version,
            overwrite,
            force,
            local,
            limit,
            gaf,
        } => {
            gobel_cli::commands::populate::run(
                database_url,
                version.clone(),
                *overwrite,
                *force,
                local.clone(),
                *limit,
                gaf.clone(),
            )
            .await
        }

        Commands::Annotate {
            gaf,
            version,
            force,
        } => {
            gobel_cli::commands::annotate::run(database_url, gaf.clone(), version.clone(), *force)
                .await
        }

        Commands::Term {
            id,
            name,
            version,
            json,
        } => {
            gobel_cli::commands::term::run(database_url, id.clone(), *name, version.clone(), *json)
                .await
        }

        Commands::Ancestors {
            id,
            kinds,
            version,
            json,
        } => {
            gobel_cli::commands::traverse::ancestors(
                database_url,
                id.clone(),
                kinds.clone(),
                version.clone(),
                *json,
            )
            .await
        }

        Commands::Descendants {
            id,
            kinds,
            version,
            json,
        } => {
            gobel_cli::commands::traverse::descendants(
                database_url,
                id.clone(),
                kinds.clone(),
                version.clone(),
                *json,
            )
            .await
        }

        Commands::Summarize { version, json } => {
            gobel_cli::commands::summarize::run(database_url, version.clone(), *json).await
        }

        Commands::Versions { json } => {
            gobel_cli::commands::versions::run(database_url, *json).await
        }
    }
}
