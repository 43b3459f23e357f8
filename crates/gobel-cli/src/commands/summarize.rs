//! `gobel summarize` command implementation
//!
//! Shows statistics for one stored graph version.

use crate::error::{CliError, Result};
use colored::Colorize;

/// Show statistics for a stored graph version
pub async fn run(database_url: Option<String>, version: Option<String>, json: bool) -> Result<()> {
    let manager = super::connect(database_url).await?;

    if !manager.is_populated().await? {
        return Err(CliError::EmptyDatabase);
    }

    let summary = manager.summarize(version.as_deref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", format!("Graph version {}", summary.version).cyan().bold());
    println!();
    println!("  Committed:   {}", super::format_timestamp(&summary.committed_at));
    println!("  Digest:      {}", &summary.content_digest[..16]);
    println!(
        "  Terms:       {} ({} obsolete)",
        summary.term_count, summary.obsolete_count
    );
    for (namespace, count) in &summary.terms_by_namespace {
        println!("    {:<24} {}", namespace, count);
    }
    println!("  Relations:   {}", summary.relation_count);
    for (kind, count) in &summary.relations_by_kind {
        println!("    {:<24} {}", kind, count);
    }
    println!("  Synonyms:    {}", summary.synonym_count);
    println!("  Alt IDs:     {}", summary.alt_id_count);
    println!(
        "  Annotations: {} across {} gene product(s)",
        summary.annotation_count, summary.annotated_target_count
    );

    Ok(())
}
