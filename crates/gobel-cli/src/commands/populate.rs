//! `gobel populate` command implementation
//!
//! Downloads an ontology release, builds the graph, and commits it to the
//! database under a version label.

use crate::error::Result;
use colored::Colorize;
use gobel_core::{CommitMode, CommitOutcome, GobelConfig, Manager, PopulateOptions, PopulateReport};
use std::path::PathBuf;

/// Populate the database from an ontology release
pub async fn run(
    database_url: Option<String>,
    version: Option<String>,
    overwrite: bool,
    force: bool,
    local: Option<PathBuf>,
    limit: Option<usize>,
    gaf: Vec<String>,
) -> Result<()> {
    let mut config = GobelConfig::from_env();
    if let Some(url) = database_url {
        config.database_url = url;
    }
    if let Some(path) = &local {
        config.local_obo_path = Some(path.clone());
    }

    match &local {
        Some(path) => println!("{} Reading ontology from {}...", "→".cyan(), path.display()),
        None => println!("{} Fetching ontology from {}...", "→".cyan(), config.obo_url),
    }

    let manager = Manager::connect(config).await?;

    let options = PopulateOptions {
        version,
        mode: if overwrite {
            CommitMode::Overwrite
        } else {
            CommitMode::Reject
        },
        force_download: force,
        limit,
    };

    let report = manager.populate(options).await?;

    println!("{} {}", "✓".green(), describe_outcome(&report));

    if report.warning_count > 0 {
        println!(
            "{} {} warning(s) during parsing and graph construction (re-run with --verbose for details)",
            "⚠".yellow(),
            report.warning_count
        );
    }

    for source in &gaf {
        println!("{} Reading annotations from {}...", "→".cyan(), source);
        let annotation_report = manager
            .annotate(Some(source.as_str()), Some(report.version.as_str()), force)
            .await?;
        super::annotate::print_report(&annotation_report);
    }

    Ok(())
}

/// One-line summary of a populate run
fn describe_outcome(report: &PopulateReport) -> String {
    match &report.outcome {
        CommitOutcome::Committed { replaced, .. } => {
            let verb = if *replaced { "Replaced" } else { "Committed" };
            format!(
                "{} version {}: {} terms, {} relations in {:.1}s",
                verb, report.version, report.term_count, report.relation_count, report.elapsed_secs
            )
        }
        CommitOutcome::Unchanged { .. } => format!(
            "Version {} is already stored with identical content",
            report.version
        ),
    }
}
