// OBO and GAF parsers

use crate::models::{is_valid_go_id, Namespace, RelationKind, Synonym, SynonymScope};
use tracing::{debug, info, warn};

// ============================================================================
// Parse Warnings
// ============================================================================

/// A non-fatal problem encountered while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the source document
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

// ============================================================================
// OBO Document
// ============================================================================

/// OBO header tags captured before the first stanza
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OboHeader {
    pub format_version: Option<String>,
    pub data_version: Option<String>,
    pub ontology: Option<String>,
}

impl OboHeader {
    /// Extract the release date from a `data-version: releases/YYYY-MM-DD` tag
    pub fn release_version(&self) -> Option<String> {
        let data_version = self.data_version.as_deref()?;
        let date = data_version.strip_prefix("releases/")?;
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some(date.to_string())
    }
}

/// A relation declaration inside a term stanza
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDecl {
    pub kind: RelationKind,
    pub target_id: String,
}

/// A cleanly parsed `[Term]` stanza
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    pub id: String,
    pub name: String,
    pub namespace: Namespace,
    pub definition: Option<String>,
    pub is_obsolete: bool,
    pub synonyms: Vec<Synonym>,
    pub alt_ids: Vec<String>,
    pub relations: Vec<RelationDecl>,
    /// 1-based line number of the stanza's `[Term]` marker
    pub line: usize,
}

/// Per-stanza parse result
///
/// Field-level oddities are recorded as warnings and never fail a stanza;
/// a stanza without a usable identifier is the one unrecoverable case and
/// is tagged `Malformed` for the builder to abort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermOutcome {
    Parsed(TermRecord),
    Skipped { line: usize, reason: String },
    Malformed { line: usize, reason: String },
}

/// The parsed OBO document handed to the graph builder
#[derive(Debug, Clone, Default)]
pub struct OboDocument {
    pub header: OboHeader,
    pub outcomes: Vec<TermOutcome>,
    pub warnings: Vec<ParseWarning>,
}

impl OboDocument {
    /// Iterate the cleanly parsed term records
    pub fn records(&self) -> impl Iterator<Item = &TermRecord> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            TermOutcome::Parsed(record) => Some(record),
            _ => None,
        })
    }
}

// ============================================================================
// OBO Parser
// ============================================================================

pub struct OboParser;

impl OboParser {
    /// Parse an OBO export into header, term outcomes, and warnings
    ///
    /// Only `[Term]` stanzas produce outcomes; other stanza kinds
    /// (`[Typedef]`, ...) are passed over. `limit` caps the number of
    /// stanzas consumed, for development runs against the full ontology.
    pub fn parse(content: &str, limit: Option<usize>) -> OboDocument {
        let lines: Vec<&str> = content.lines().collect();
        let mut document = OboDocument::default();
        let mut i = 0;

        info!("Starting OBO parsing (limit: {:?})", limit);

        // Header runs until the first stanza marker
        while i < lines.len() {
            let line = lines[i].trim();
            if line.starts_with('[') {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "format-version" => document.header.format_version = Some(value.to_string()),
                    "data-version" => document.header.data_version = Some(value.to_string()),
                    "ontology" => document.header.ontology = Some(value.to_string()),
                    _ => {},
                }
            }
            i += 1;
        }

        // Stanzas
        while i < lines.len() {
            if let Some(max_terms) = limit {
                if document.outcomes.len() >= max_terms {
                    info!("Reached parse limit of {} term stanzas", max_terms);
                    break;
                }
            }

            if lines[i].trim() == "[Term]" {
                let outcome = Self::parse_term_stanza(&lines, &mut i, &mut document.warnings);
                document.outcomes.push(outcome);
            } else {
                i += 1;
            }
        }

        let parsed = document.records().count();
        info!(
            "Parsed {} term records from {} stanzas ({} warnings)",
            parsed,
            document.outcomes.len(),
            document.warnings.len()
        );

        document
    }

    /// Parse a single [Term] stanza into a tagged outcome
    fn parse_term_stanza(
        lines: &[&str],
        i: &mut usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> TermOutcome {
        let stanza_line = *i + 1;
        *i += 1; // Skip [Term] marker

        let mut id: Option<String> = None;
        let mut name: Option<String> = None;
        let mut namespace: Option<Namespace> = None;
        let mut definition: Option<String> = None;
        let mut is_obsolete = false;
        let mut synonyms = Vec::new();
        let mut alt_ids = Vec::new();
        let mut relations = Vec::new();

        while *i < lines.len() {
            let line_no = *i + 1;
            let line = lines[*i].trim();

            // End of stanza
            if line.is_empty() || line.starts_with('[') {
                break;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "id" => id = Some(value.to_string()),
                    "name" => name = Some(value.to_string()),
                    "namespace" => match Namespace::from_str(value) {
                        Ok(ns) => namespace = Some(ns),
                        Err(reason) => warn_field(warnings, line_no, reason),
                    },
                    "def" => definition = Some(extract_quoted_text(value)),
                    "is_obsolete" => is_obsolete = value == "true",
                    "synonym" => match parse_synonym(value) {
                        Ok(synonym) => synonyms.push(synonym),
                        Err(reason) => warn_field(warnings, line_no, reason),
                    },
                    "alt_id" => alt_ids.push(value.to_string()),
                    "is_a" => {
                        // Value reads "GO:0008150 ! biological_process"
                        match value.split_whitespace().next() {
                            Some(target) => relations.push(RelationDecl {
                                kind: RelationKind::IsA,
                                target_id: target.to_string(),
                            }),
                            None => warn_field(warnings, line_no, "is_a without a target"),
                        }
                    },
                    "relationship" => {
                        // Value reads "part_of GO:0008150 ! biological_process"
                        let mut parts = value.split_whitespace();
                        match (parts.next(), parts.next()) {
                            (Some(kind), Some(target)) => match RelationKind::from_str(kind) {
                                Ok(kind) => relations.push(RelationDecl {
                                    kind,
                                    target_id: target.to_string(),
                                }),
                                Err(reason) => warn_field(warnings, line_no, reason),
                            },
                            _ => warn_field(warnings, line_no, "relationship without kind and target"),
                        }
                    },
                    _ => {}, // Other tags carry no graph content
                }
            }

            *i += 1;
        }

        // The identifier is the one thing a stanza cannot miss
        let id = match id {
            Some(id) if is_valid_go_id(&id) => id,
            Some(id) => {
                return TermOutcome::Malformed {
                    line: stanza_line,
                    reason: format!("invalid term identifier: {}", id),
                }
            },
            None => {
                return TermOutcome::Malformed {
                    line: stanza_line,
                    reason: "term stanza without an id".to_string(),
                }
            },
        };

        let Some(name) = name else {
            return TermOutcome::Skipped {
                line: stanza_line,
                reason: format!("{} has no name", id),
            };
        };

        let Some(namespace) = namespace else {
            return TermOutcome::Skipped {
                line: stanza_line,
                reason: format!("{} has no namespace", id),
            };
        };

        TermOutcome::Parsed(TermRecord {
            id,
            name,
            namespace,
            definition,
            is_obsolete,
            synonyms,
            alt_ids,
            relations,
            line: stanza_line,
        })
    }
}

fn warn_field(warnings: &mut Vec<ParseWarning>, line: usize, message: impl Into<String>) {
    let warning = ParseWarning {
        line,
        message: message.into(),
    };
    warn!("OBO {}", warning);
    warnings.push(warning);
}

/// Extract the leading quoted text from a tag value
/// Example: "\"biological_process\" [GO:curators]" -> "biological_process"
fn extract_quoted_text(text: &str) -> String {
    if let Some(start) = text.find('"') {
        if let Some(end) = text[start + 1..].find('"') {
            return text[start + 1..start + 1 + end].to_string();
        }
    }
    text.to_string()
}

/// Parse a synonym tag value
/// Example: "\"T cell activation\" EXACT []" -> (Exact, "T cell activation")
fn parse_synonym(text: &str) -> Result<Synonym, String> {
    let parts: Vec<&str> = text.split('"').collect();
    if parts.len() < 2 {
        return Err(format!("invalid synonym format: {}", text));
    }

    let syn_text = parts[1].to_string();
    let remainder = parts.get(2).copied().unwrap_or("");
    let scope_str = remainder.split_whitespace().next().unwrap_or("");

    let scope = if scope_str.is_empty() {
        SynonymScope::Related
    } else {
        SynonymScope::from_str(scope_str)?
    };

    Ok(Synonym {
        scope,
        text: syn_text,
    })
}

// ============================================================================
// GAF Parser (GO annotations)
// ============================================================================

/// A single usable GAF annotation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GafRecord {
    pub db: String,
    pub db_id: String,
    pub db_symbol: String,
    pub qualifier: Option<String>,
    pub go_id: String,
    /// Raw reference, e.g. "PMID:12345678"
    pub reference: Option<String>,
    pub evidence_code: String,
    /// Taxonomy identifier with the "taxon:" prefix stripped
    pub taxon_id: String,
}

/// Parsed GAF document
#[derive(Debug, Clone, Default)]
pub struct GafDocument {
    pub records: Vec<GafRecord>,
    pub skipped: usize,
}

pub struct GafParser;

impl GafParser {
    /// Parse a GAF 2.x file
    ///
    /// GAF format: tab-delimited, 17 columns
    /// Column 1: DB (e.g., "UniProtKB")
    /// Column 2: DB Object ID (e.g., "P01308")
    /// Column 3: DB Object Symbol
    /// Column 4: Qualifier
    /// Column 5: GO ID
    /// Column 6: DB:Reference
    /// Column 7: Evidence Code
    /// Column 8: With (or) From
    /// Column 9: Aspect (P/F/C)
    /// Column 10: DB Object Name
    /// Column 11: DB Object Synonym
    /// Column 12: DB Object Type
    /// Column 13: Taxon
    /// Column 14: Date
    /// Column 15: Assigned By
    /// Column 16: Annotation Extension
    /// Column 17: Gene Product Form ID
    ///
    /// Rows that cannot be used are skipped and counted, never fatal.
    pub fn parse(content: &str, limit: Option<usize>) -> GafDocument {
        let mut document = GafDocument::default();

        info!("Starting GAF parsing (limit: {:?})", limit);

        for line in content.lines() {
            // Comment lines open with '!'
            if line.starts_with('!') || line.trim().is_empty() {
                continue;
            }

            if let Some(max_records) = limit {
                if document.records.len() >= max_records {
                    info!("Reached parse limit of {} annotations", max_records);
                    break;
                }
            }

            match Self::parse_gaf_line(line) {
                Ok(record) => document.records.push(record),
                Err(reason) => {
                    debug!("Skipping GAF line: {}", reason);
                    document.skipped += 1;
                },
            }
        }

        info!(
            "Parsed {} annotations ({} rows skipped)",
            document.records.len(),
            document.skipped
        );

        document
    }

    /// Parse a single GAF data line
    fn parse_gaf_line(line: &str) -> Result<GafRecord, String> {
        let columns: Vec<&str> = line.split('\t').collect();

        if columns.len() < 15 {
            return Err(format!(
                "expected 15+ columns, got {}",
                columns.len()
            ));
        }

        let db = columns[0].trim();
        let db_id = columns[1].trim();
        let db_symbol = columns[2].trim();
        let qualifier = columns[3].trim();
        let go_id = columns[4].trim();
        let reference = columns[5].trim();
        let evidence_code = columns[6].trim();
        let taxon_str = columns[12].trim();

        if db.is_empty() || db_id.is_empty() {
            return Err("row without a gene product".to_string());
        }
        if !is_valid_go_id(go_id) {
            return Err(format!("invalid GO ID: {}", go_id));
        }
        if evidence_code.is_empty() {
            return Err("row without an evidence code".to_string());
        }

        let taxon_id = Self::parse_taxon(taxon_str)
            .ok_or_else(|| format!("unparseable taxon: {}", taxon_str))?;

        Ok(GafRecord {
            db: db.to_string(),
            db_id: db_id.to_string(),
            db_symbol: db_symbol.to_string(),
            qualifier: non_empty(qualifier),
            go_id: go_id.to_string(),
            reference: non_empty(reference),
            evidence_code: evidence_code.to_string(),
            taxon_id,
        })
    }

    /// Parse a taxon column like "taxon:9606" or "taxon:9606|taxon:10090"
    fn parse_taxon(taxon_str: &str) -> Option<String> {
        let first = taxon_str
            .strip_prefix("taxon:")
            .and_then(|s| s.split('|').next())?;
        if first.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(first.to_string())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
