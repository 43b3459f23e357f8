//! `gobel term` command implementation
//!
//! Looks up a single term by identifier (or name) and prints its details.

use crate::error::{CliError, Result};
use colored::Colorize;
use gobel_core::TermDetail;

/// Look up and display a single term
pub async fn run(
    database_url: Option<String>,
    id: String,
    by_name: bool,
    version: Option<String>,
    json: bool,
) -> Result<()> {
    let manager = super::connect(database_url).await?;

    if !manager.is_populated().await? {
        return Err(CliError::EmptyDatabase);
    }

    let detail = if by_name {
        manager.get_term_by_name(&id, version.as_deref()).await?
    } else {
        manager.get_term(&id, version.as_deref()).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    if detail.is_obsolete {
        println!("{} {}", detail.id.green().bold(), "(obsolete)".red());
    } else {
        println!("{}", detail.id.green().bold());
    }
    print!("{}", format_body(&detail));

    Ok(())
}

/// Indented field block below the identifier header
fn format_body(detail: &TermDetail) -> String {
    let mut out = String::new();

    out.push_str(&format!("  Name:        {}\n", detail.name));
    out.push_str(&format!("  Namespace:   {}\n", detail.namespace));

    if let Some(definition) = &detail.definition {
        out.push_str(&format!("  Definition:  {}\n", definition));
    }

    if !detail.synonyms.is_empty() {
        for (i, synonym) in detail.synonyms.iter().enumerate() {
            let label = if i == 0 { "Synonyms:   " } else { "            " };
            out.push_str(&format!("  {} {} \"{}\"\n", label, synonym.scope, synonym.text));
        }
    }

    if !detail.alt_ids.is_empty() {
        out.push_str(&format!("  Alt IDs:     {}\n", detail.alt_ids.join(", ")));
    }

    out.push_str(&format!("  Annotations: {}\n", detail.annotation_count));
    out.push_str(&format!("  Version:     {}\n", detail.version));

    if let Some(alt) = &detail.matched_alt_id {
        out.push_str(&format!("  Matched via alternate id {}\n", alt));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gobel_core::{Synonym, SynonymScope};

    fn detail() -> TermDetail {
        TermDetail {
            id: "GO:0000001".to_string(),
            name: "mitochondrion inheritance".to_string(),
            namespace: "biological_process".to_string(),
            definition: Some("The distribution of mitochondria.".to_string()),
            is_obsolete: false,
            synonyms: vec![Synonym {
                scope: SynonymScope::Exact,
                text: "mitochondrial inheritance".to_string(),
            }],
            alt_ids: vec!["GO:0048308".to_string()],
            annotation_count: 4,
            version: "2026-01-01".to_string(),
            matched_alt_id: None,
        }
    }

    #[test]
    fn test_format_body_full() {
        let body = format_body(&detail());
        assert!(body.contains("Name:        mitochondrion inheritance"));
        assert!(body.contains("Namespace:   biological_process"));
        assert!(body.contains("EXACT \"mitochondrial inheritance\""));
        assert!(body.contains("Alt IDs:     GO:0048308"));
        assert!(body.contains("Annotations: 4"));
        assert!(body.contains("Version:     2026-01-01"));
    }

    #[test]
    fn test_format_body_omits_empty_sections() {
        let mut d = detail();
        d.definition = None;
        d.synonyms.clear();
        d.alt_ids.clear();
        let body = format_body(&d);
        assert!(!body.contains("Definition:"));
        assert!(!body.contains("Synonyms:"));
        assert!(!body.contains("Alt IDs:"));
    }

    #[test]
    fn test_format_body_notes_alternate_match() {
        let mut d = detail();
        d.matched_alt_id = Some("GO:0048308".to_string());
        let body = format_body(&d);
        assert!(body.contains("Matched via alternate id GO:0048308"));
    }
}
