// Gene Ontology domain models

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Validate a GO identifier ("GO:" followed by exactly seven digits)
pub fn is_valid_go_id(go_id: &str) -> bool {
    go_id.starts_with("GO:") && go_id.len() == 10 && go_id[3..].chars().all(|c| c.is_ascii_digit())
}

/// If a GO identifier does not carry the `GO:` prefix, add it
///
/// Accepts bare accessions like "0008150" as a convenience on the query
/// surface; stored identifiers always carry the prefix.
pub fn normalize_go_id(identifier: &str) -> String {
    if identifier.starts_with("GO:") {
        identifier.to_string()
    } else {
        format!("GO:{}", identifier)
    }
}

// ============================================================================
// Term
// ============================================================================

/// A Gene Ontology term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// GO identifier (e.g., "GO:0008150")
    pub id: String,

    /// Term name (e.g., "biological_process")
    pub name: String,

    /// Namespace the term belongs to
    pub namespace: Namespace,

    /// Term definition
    pub definition: Option<String>,

    /// Whether the term is obsolete
    pub is_obsolete: bool,

    /// Synonyms
    pub synonyms: Vec<Synonym>,

    /// Secondary identifiers that resolve to this term
    pub alt_ids: Vec<String>,
}

impl Term {
    /// Create a new term with identifier validation
    pub fn new(id: String, name: String, namespace: Namespace) -> Result<Self, String> {
        if !is_valid_go_id(&id) {
            return Err(format!("Invalid GO ID: {}", id));
        }

        Ok(Term {
            id,
            name,
            namespace,
            definition: None,
            is_obsolete: false,
            synonyms: Vec::new(),
            alt_ids: Vec::new(),
        })
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// GO namespace (the three sub-ontologies)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
}

impl Namespace {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "biological_process" => Ok(Namespace::BiologicalProcess),
            "molecular_function" => Ok(Namespace::MolecularFunction),
            "cellular_component" => Ok(Namespace::CellularComponent),
            _ => Err(format!("Unknown namespace: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::BiologicalProcess => "biological_process",
            Namespace::MolecularFunction => "molecular_function",
            Namespace::CellularComponent => "cellular_component",
        }
    }

    pub const ALL: [Namespace; 3] = [
        Namespace::BiologicalProcess,
        Namespace::MolecularFunction,
        Namespace::CellularComponent,
    ];
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Synonym
// ============================================================================

/// A term synonym
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    /// Synonym scope (EXACT, BROAD, NARROW, RELATED)
    pub scope: SynonymScope,

    /// Synonym text
    pub text: String,
}

/// Synonym scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SynonymScope {
    Exact,
    Broad,
    Narrow,
    Related,
}

impl SynonymScope {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "EXACT" => Ok(SynonymScope::Exact),
            "BROAD" => Ok(SynonymScope::Broad),
            "NARROW" => Ok(SynonymScope::Narrow),
            "RELATED" => Ok(SynonymScope::Related),
            _ => Err(format!("Unknown synonym scope: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SynonymScope::Exact => "EXACT",
            SynonymScope::Broad => "BROAD",
            SynonymScope::Narrow => "NARROW",
            SynonymScope::Related => "RELATED",
        }
    }
}

impl std::fmt::Display for SynonymScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Relation
// ============================================================================

/// A directed edge between two terms (DAG edge)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Source (subject/child) term identifier
    pub source_id: String,

    /// Target (object/parent) term identifier
    pub target_id: String,

    /// Relation kind
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(source_id: String, target_id: String, kind: RelationKind) -> Self {
        Relation {
            source_id,
            target_id,
            kind,
        }
    }
}

// ============================================================================
// Relation Kind
// ============================================================================

/// The relation kinds GO exports use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    IsA,
    PartOf,
    HasPart,
    Regulates,
    PositivelyRegulates,
    NegativelyRegulates,
    OccursIn,
    EndsDuring,
    HappensDuring,
}

impl RelationKind {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "is_a" => Ok(RelationKind::IsA),
            "part_of" => Ok(RelationKind::PartOf),
            "has_part" => Ok(RelationKind::HasPart),
            "regulates" => Ok(RelationKind::Regulates),
            "positively_regulates" => Ok(RelationKind::PositivelyRegulates),
            "negatively_regulates" => Ok(RelationKind::NegativelyRegulates),
            "occurs_in" => Ok(RelationKind::OccursIn),
            "ends_during" => Ok(RelationKind::EndsDuring),
            "happens_during" => Ok(RelationKind::HappensDuring),
            _ => Err(format!("Unknown relation kind: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::IsA => "is_a",
            RelationKind::PartOf => "part_of",
            RelationKind::HasPart => "has_part",
            RelationKind::Regulates => "regulates",
            RelationKind::PositivelyRegulates => "positively_regulates",
            RelationKind::NegativelyRegulates => "negatively_regulates",
            RelationKind::OccursIn => "occurs_in",
            RelationKind::EndsDuring => "ends_during",
            RelationKind::HappensDuring => "happens_during",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Annotation Target
// ============================================================================

/// A gene product a GO term is annotated to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationTarget {
    /// Source database (e.g., "UniProtKB", "ComplexPortal")
    pub db: String,

    /// Identifier within the source database
    pub db_id: String,

    /// Display symbol (e.g., a gene symbol)
    pub db_symbol: String,

    /// NCBI taxonomy identifier (the "taxon:" prefix stripped)
    pub taxon_id: String,
}

// ============================================================================
// Annotation
// ============================================================================

/// A GO annotation linking a gene product to a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotated GO term identifier
    pub go_id: String,

    /// Source database of the annotated gene product
    pub db: String,

    /// Identifier of the annotated gene product
    pub db_id: String,

    /// Qualifier (e.g., "involved_in", "NOT|located_in")
    pub qualifier: Option<String>,

    /// Provenance database (e.g., "PMID" from "PMID:12345678")
    pub provenance_db: Option<String>,

    /// Provenance identifier within that database
    pub provenance_id: Option<String>,

    /// Evidence code (e.g., "IDA", "IEA")
    pub evidence_code: EvidenceCode,
}

// ============================================================================
// Evidence Code
// ============================================================================

/// GO evidence codes
/// See: http://geneontology.org/docs/guide-go-evidence-codes/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceCode(pub String);

impl EvidenceCode {
    /// Experimental evidence codes
    pub const EXP: &'static str = "EXP"; // Inferred from Experiment
    pub const IDA: &'static str = "IDA"; // Inferred from Direct Assay
    pub const IPI: &'static str = "IPI"; // Inferred from Physical Interaction
    pub const IMP: &'static str = "IMP"; // Inferred from Mutant Phenotype
    pub const IGI: &'static str = "IGI"; // Inferred from Genetic Interaction
    pub const IEP: &'static str = "IEP"; // Inferred from Expression Pattern

    /// Electronic annotation evidence
    pub const IEA: &'static str = "IEA"; // Inferred from Electronic Annotation

    pub fn new(code: impl Into<String>) -> Self {
        EvidenceCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_experimental(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::EXP | Self::IDA | Self::IPI | Self::IMP | Self::IGI | Self::IEP
        )
    }

    pub fn is_electronic(&self) -> bool {
        self.0 == Self::IEA
    }
}

impl std::fmt::Display for EvidenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
