//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod annotate;
pub mod populate;
pub mod summarize;
pub mod term;
pub mod traverse;
pub mod versions;

use chrono::{DateTime, Utc};

use crate::error::Result;
use gobel_core::{GobelConfig, Manager};

/// Build the effective configuration and connect to the database
///
/// Settings come from the environment (and `.env`), with the command-line
/// database URL taking precedence.
pub(crate) async fn connect(database_url: Option<String>) -> Result<Manager> {
    let mut config = GobelConfig::from_env();
    if let Some(url) = database_url {
        config.database_url = url;
    }
    Ok(Manager::connect(config).await?)
}

/// Timestamp form used when listing stored versions
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
