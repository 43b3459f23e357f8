//! `gobel annotate` command implementation
//!
//! Downloads a GAF association file and stores its annotations against a
//! committed graph version.

use crate::error::{CliError, Result};
use colored::Colorize;
use gobel_core::AnnotateReport;

/// Attach gene product annotations to a stored graph
pub async fn run(
    database_url: Option<String>,
    gaf: Option<String>,
    version: Option<String>,
    force: bool,
) -> Result<()> {
    let manager = super::connect(database_url).await?;

    if !manager.is_populated().await? {
        return Err(CliError::EmptyDatabase);
    }

    match &gaf {
        Some(source) => println!("{} Reading annotations from {}...", "→".cyan(), source),
        None => println!(
            "{} Fetching annotations from {}...",
            "→".cyan(),
            manager.config().gaf_url
        ),
    }

    let report = manager
        .annotate(gaf.as_deref(), version.as_deref(), force)
        .await?;

    print_report(&report);

    Ok(())
}

/// Annotation outcome block, shared with `populate --gaf`
pub(crate) fn print_report(report: &AnnotateReport) {
    println!(
        "{} Stored {} annotation(s) for {} gene product(s) against version {}",
        "✓".green(),
        report.stats.annotations_stored,
        report.stats.targets_stored,
        report.version
    );
    println!(
        "  Evidence:  {} experimental, {} electronic",
        report.experimental_count, report.electronic_count
    );

    if report.rows_skipped > 0 {
        println!(
            "{} {} malformed GAF row(s) skipped during parsing",
            "⚠".yellow(),
            report.rows_skipped
        );
    }
    if report.stats.annotations_skipped > 0 {
        println!(
            "{} {} annotation(s) referenced terms absent from the graph and were skipped",
            "⚠".yellow(),
            report.stats.annotations_skipped
        );
    }
}
