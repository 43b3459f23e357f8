//! `gobel ancestors` and `gobel descendants` command implementations
//!
//! Walks the stored graph from a start term and prints every reachable
//! term with its distance from the start.

use crate::error::{CliError, Result};
use colored::Colorize;
use gobel_core::{RelationKind, TraversalResult};

enum Direction {
    Up,
    Down,
}

impl Direction {
    fn noun(&self) -> &'static str {
        match self {
            Direction::Up => "ancestor",
            Direction::Down => "descendant",
        }
    }
}

/// Walk upward over the selected relation kinds
pub async fn ancestors(
    database_url: Option<String>,
    id: String,
    kinds: Vec<String>,
    version: Option<String>,
    json: bool,
) -> Result<()> {
    run(Direction::Up, database_url, id, kinds, version, json).await
}

/// Walk downward over the selected relation kinds
pub async fn descendants(
    database_url: Option<String>,
    id: String,
    kinds: Vec<String>,
    version: Option<String>,
    json: bool,
) -> Result<()> {
    run(Direction::Down, database_url, id, kinds, version, json).await
}

async fn run(
    direction: Direction,
    database_url: Option<String>,
    id: String,
    kinds: Vec<String>,
    version: Option<String>,
    json: bool,
) -> Result<()> {
    let kinds = parse_kinds(&kinds)?;

    let manager = super::connect(database_url).await?;

    if !manager.is_populated().await? {
        return Err(CliError::EmptyDatabase);
    }

    let result = match direction {
        Direction::Up => manager.ancestors(&id, &kinds, version.as_deref()).await?,
        Direction::Down => manager.descendants(&id, &kinds, version.as_deref()).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} {}(s) of {} [{}] in version {}",
        "✓".green(),
        result.terms.len(),
        direction.noun(),
        result.start,
        result.kinds.join(", "),
        result.version
    );
    print!("{}", format_terms(&result));

    Ok(())
}

/// Parse relation kind names from the command line
fn parse_kinds(kinds: &[String]) -> Result<Vec<RelationKind>> {
    kinds
        .iter()
        .map(|s| RelationKind::from_str(s).map_err(|_| CliError::invalid_kind(s)))
        .collect()
}

/// One line per reached term, indented under the header
fn format_terms(result: &TraversalResult) -> String {
    let mut out = String::new();
    for term in &result.terms {
        out.push_str(&format!("  {}  {}  {}\n", term.depth, term.id, term.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gobel_core::TraversalTerm;

    #[test]
    fn test_parse_kinds_valid() {
        let kinds = parse_kinds(&["is_a".to_string(), "part_of".to_string()]).unwrap();
        assert_eq!(kinds, vec![RelationKind::IsA, RelationKind::PartOf]);
    }

    #[test]
    fn test_parse_kinds_empty() {
        assert!(parse_kinds(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_kinds_rejects_unknown() {
        let err = parse_kinds(&["isa".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidKind(_)));
        assert!(err.to_string().contains("'isa'"));
    }

    #[test]
    fn test_format_terms_includes_depth_and_name() {
        let result = TraversalResult {
            start: "GO:0000003".to_string(),
            version: "2026-01-01".to_string(),
            kinds: vec!["is_a".to_string()],
            terms: vec![
                TraversalTerm {
                    id: "GO:0000002".to_string(),
                    name: "second".to_string(),
                    depth: 1,
                },
                TraversalTerm {
                    id: "GO:0000001".to_string(),
                    name: "first".to_string(),
                    depth: 2,
                },
            ],
        };
        let text = format_terms(&result);
        assert!(text.contains("1  GO:0000002  second"));
        assert!(text.contains("2  GO:0000001  first"));
    }
}
