//! Gene Ontology ingestion, graph validation and versioned querying
//!
//! The crate turns OBO ontology releases into validated relational graphs:
//!
//! - Download: HTTP client for OBO/GAF files with on-disk caching
//! - Parse: OBO format parser + GAF annotation parser
//! - Build: two-pass graph construction with referential and cycle checks
//! - Store: versioned, idempotent persistence to SQLite
//! - Query: term lookups, breadth-first traversals and summaries
//!
//! Data sources:
//! - GO Ontology: http://purl.obolibrary.org/obo/go/go-basic.obo (~40MB)
//! - GOA Annotations: http://geneontology.org/gene-associations/goa_human.gaf.gz

pub mod config;
pub mod downloader;
pub mod graph;
pub mod manager;
pub mod models;
pub mod parser;
pub mod queries;
pub mod storage;

// Re-export main types
pub use config::GobelConfig;
pub use downloader::{DownloadError, Downloader};
pub use graph::{BuildError, DanglingReference, GraphBuilder, OntologyGraph};
pub use manager::{
    AnnotateReport, Manager, ManagerError, PopulateOptions, PopulateReport,
};
pub use models::{
    normalize_go_id, Annotation, AnnotationTarget, EvidenceCode, Namespace, Relation,
    RelationKind, Synonym, SynonymScope, Term,
};
pub use parser::{GafDocument, GafParser, OboDocument, OboParser, ParseWarning, TermOutcome};
pub use queries::{
    GraphSummary, TermDetail, TraversalResult, TraversalTerm, DEFAULT_TRAVERSAL_KINDS,
};
pub use storage::{
    AnnotationStats, CommitMode, CommitOutcome, GraphStore, StorageError, VersionRecord,
};
