//! `gobel versions` command implementation
//!
//! Lists stored graph versions, newest first.

use crate::error::Result;
use colored::Colorize;

/// List stored graph versions
pub async fn run(database_url: Option<String>, json: bool) -> Result<()> {
    let manager = super::connect(database_url).await?;

    let records = manager.list_versions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No graph versions stored.");
        println!("Run 'gobel populate' to load an ontology release.");
        return Ok(());
    }

    println!("{}", "Stored Versions:".cyan().bold());
    println!();

    for record in &records {
        println!("{}", record.version.green());
        println!("  Terms:     {}", record.term_count);
        println!("  Relations: {}", record.relation_count);
        println!("  Digest:    {}", &record.content_digest[..16]);
        println!("  Committed: {}", super::format_timestamp(&record.committed_at));
        println!();
    }

    println!("Total versions: {}", records.len());

    Ok(())
}
