// Ingestion orchestration and read API

use crate::config::GobelConfig;
use crate::downloader::{DownloadError, Downloader};
use crate::graph::{BuildError, GraphBuilder, OntologyGraph};
use crate::models::{Annotation, AnnotationTarget, EvidenceCode, RelationKind};
use crate::parser::{GafParser, GafRecord, OboParser};
use crate::queries::{self, GraphSummary, TermDetail, TraversalResult, DEFAULT_TRAVERSAL_KINDS};
use crate::storage::{
    self, AnnotationStats, CommitMode, CommitOutcome, GraphStore, StorageError, VersionRecord,
};
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, ManagerError>;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("graph construction failed: {0}")]
    Build(#[from] BuildError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No version label could be determined for a commit
    #[error("cannot determine graph version: {0}")]
    MissingVersion(String),
}

// ============================================================================
// Reports
// ============================================================================

/// Options controlling one populate run
#[derive(Debug, Clone, Default)]
pub struct PopulateOptions {
    /// Version label override; defaults to the document's release date
    pub version: Option<String>,

    /// How to treat an existing version with different content
    pub mode: CommitMode,

    /// Re-download even when a cached copy exists
    pub force_download: bool,

    /// Cap on parsed term stanzas, overriding the configured limit
    pub limit: Option<usize>,
}

/// Outcome of one populate run
#[derive(Debug, Clone)]
pub struct PopulateReport {
    pub version: String,
    pub outcome: CommitOutcome,
    pub term_count: usize,
    pub relation_count: usize,
    pub warning_count: usize,
    pub elapsed_secs: f64,
}

/// Outcome of one annotation run
#[derive(Debug, Clone)]
pub struct AnnotateReport {
    pub version: String,
    /// GAF rows that parsed
    pub rows_parsed: usize,
    /// GAF rows the parser rejected
    pub rows_skipped: usize,
    pub stats: AnnotationStats,
    pub experimental_count: usize,
    pub electronic_count: usize,
}

// ============================================================================
// Manager
// ============================================================================

/// Owns the database handle and orchestrates ingestion and queries
///
/// Construct one per database; clones of the inner pool are cheap, so the
/// manager can be shared behind a reference or cloned freely.
#[derive(Clone)]
pub struct Manager {
    config: GobelConfig,
    store: GraphStore,
}

impl Manager {
    /// Connect to the configured database and prepare the schema
    pub async fn connect(config: GobelConfig) -> Result<Self> {
        config.validate().map_err(ManagerError::Config)?;

        let pool = storage::create_pool(&config.database_url).await?;
        storage::init_schema(&pool).await?;

        Ok(Manager {
            config,
            store: GraphStore::new(pool),
        })
    }

    /// Wrap an existing pool; the schema must already be initialized
    pub fn from_pool(config: GobelConfig, pool: SqlitePool) -> Self {
        Manager {
            config,
            store: GraphStore::new(pool),
        }
    }

    pub fn config(&self) -> &GobelConfig {
        &self.config
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Fetch, parse, build and commit the ontology graph
    pub async fn populate(&self, options: PopulateOptions) -> Result<PopulateReport> {
        let started = Instant::now();
        info!("Starting ontology ingestion");

        info!("Step 1/4: Fetching ontology...");
        let downloader = Downloader::new(self.config.clone())?;
        let content = downloader.fetch_ontology(options.force_download).await?;
        info!(
            "Fetched ontology: {} bytes ({} KB)",
            content.len(),
            content.len() / 1024
        );

        info!("Step 2/4: Parsing OBO document...");
        let limit = options.limit.or(self.config.parse_limit);
        let document = OboParser::parse(&content, limit);
        info!(
            "Parsed {} term stanzas ({} warnings)",
            document.outcomes.len(),
            document.warnings.len()
        );

        info!("Step 3/4: Building graph...");
        let graph = GraphBuilder::build(document)?;
        let version = match options
            .version
            .clone()
            .or_else(|| graph.version().map(String::from))
        {
            Some(v) => v,
            None => {
                return Err(ManagerError::MissingVersion(
                    "the ontology header carries no data-version release and no explicit \
                     version was given"
                        .into(),
                ));
            },
        };
        info!(
            "Built graph: {} terms, {} relations ({} warnings)",
            graph.term_count(),
            graph.relation_count(),
            graph.warnings().len()
        );

        info!("Step 4/4: Committing version {}...", version);
        let outcome = self.store.commit(&graph, &version, options.mode).await?;

        let report = PopulateReport {
            version,
            term_count: graph.term_count(),
            relation_count: graph.relation_count(),
            warning_count: graph.warnings().len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            outcome,
        };
        info!("Ontology ingestion completed in {:.1}s", report.elapsed_secs);

        Ok(report)
    }

    /// Fetch, parse and store gene product annotations for a committed version
    ///
    /// `source` may be a URL or local file path; the configured GAF URL is
    /// used when absent. `version` defaults to the latest committed graph.
    pub async fn annotate(
        &self,
        source: Option<&str>,
        version: Option<&str>,
        force_download: bool,
    ) -> Result<AnnotateReport> {
        let version = queries::resolve_version(self.pool(), version).await?;
        info!("Starting annotation ingestion for version {}", version);

        info!("Step 1/3: Fetching annotations...");
        let source = source.unwrap_or(&self.config.gaf_url);
        let downloader = Downloader::new(self.config.clone())?;
        let content = downloader.fetch_gaf(source, force_download).await?;
        info!(
            "Fetched annotations: {} bytes ({} KB)",
            content.len(),
            content.len() / 1024
        );

        info!("Step 2/3: Parsing GAF document...");
        let document = GafParser::parse(&content, self.config.parse_limit);
        info!(
            "Parsed {} annotation rows ({} skipped)",
            document.records.len(),
            document.skipped
        );

        let (targets, annotations) = collect_annotations(&document.records);
        let experimental_count = annotations
            .iter()
            .filter(|a| a.evidence_code.is_experimental())
            .count();
        let electronic_count = annotations
            .iter()
            .filter(|a| a.evidence_code.is_electronic())
            .count();
        info!(
            "Collected {} distinct targets, {} experimental and {} electronic annotations",
            targets.len(),
            experimental_count,
            electronic_count
        );

        info!("Step 3/3: Storing annotations...");
        let stats = self
            .store
            .commit_annotations(&version, &targets, &annotations)
            .await?;

        info!(
            "Annotation ingestion completed: {} stored, {} skipped",
            stats.annotations_stored, stats.annotations_skipped
        );

        Ok(AnnotateReport {
            version,
            rows_parsed: document.records.len(),
            rows_skipped: document.skipped,
            stats,
            experimental_count,
            electronic_count,
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Whether any graph has been committed
    pub async fn is_populated(&self) -> Result<bool> {
        Ok(queries::is_populated(self.pool()).await?)
    }

    pub async fn get_term(&self, id: &str, version: Option<&str>) -> Result<TermDetail> {
        Ok(queries::get_term(self.pool(), id, version).await?)
    }

    pub async fn get_term_by_name(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<TermDetail> {
        Ok(queries::get_term_by_name(self.pool(), name, version).await?)
    }

    /// Ancestors of a term; empty `kinds` means is_a and part_of
    pub async fn ancestors(
        &self,
        id: &str,
        kinds: &[RelationKind],
        version: Option<&str>,
    ) -> Result<TraversalResult> {
        let kinds = if kinds.is_empty() {
            &DEFAULT_TRAVERSAL_KINDS[..]
        } else {
            kinds
        };
        Ok(queries::query_ancestors(self.pool(), id, kinds, version).await?)
    }

    /// Descendants of a term; empty `kinds` means is_a and part_of
    pub async fn descendants(
        &self,
        id: &str,
        kinds: &[RelationKind],
        version: Option<&str>,
    ) -> Result<TraversalResult> {
        let kinds = if kinds.is_empty() {
            &DEFAULT_TRAVERSAL_KINDS[..]
        } else {
            kinds
        };
        Ok(queries::query_descendants(self.pool(), id, kinds, version).await?)
    }

    pub async fn summarize(&self, version: Option<&str>) -> Result<GraphSummary> {
        Ok(queries::summarize(self.pool(), version).await?)
    }

    pub async fn list_versions(&self) -> Result<Vec<VersionRecord>> {
        Ok(self.store.list_versions().await?)
    }

    /// Load a committed graph into memory
    pub async fn load_graph(&self, version: Option<&str>) -> Result<OntologyGraph> {
        Ok(self.store.load(version).await?)
    }
}

/// Derive deduplicated targets and annotation rows from parsed GAF records
///
/// The first occurrence of a (db, db_id) pair defines the target's symbol
/// and taxon. Provenance is the reference column split on its first colon.
fn collect_annotations(records: &[GafRecord]) -> (Vec<AnnotationTarget>, Vec<Annotation>) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut targets = Vec::new();
    let mut annotations = Vec::with_capacity(records.len());

    for record in records {
        let key = (record.db.clone(), record.db_id.clone());
        if seen.insert(key) {
            targets.push(AnnotationTarget {
                db: record.db.clone(),
                db_id: record.db_id.clone(),
                db_symbol: record.db_symbol.clone(),
                taxon_id: record.taxon_id.clone(),
            });
        }

        let (provenance_db, provenance_id) = match record.reference.as_deref() {
            Some(reference) => match reference.split_once(':') {
                Some((db, id)) => (Some(db.to_string()), Some(id.to_string())),
                None => (None, Some(reference.to_string())),
            },
            None => (None, None),
        };

        annotations.push(Annotation {
            go_id: record.go_id.clone(),
            db: record.db.clone(),
            db_id: record.db_id.clone(),
            qualifier: record.qualifier.clone(),
            provenance_db,
            provenance_id,
            evidence_code: EvidenceCode::new(record.evidence_code.clone()),
        });
    }

    (targets, annotations)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OBO_FIXTURE: &str = r#"format-version: 1.2
data-version: releases/2026-04-04
ontology: go

[Term]
id: GO:0000001
name: alpha
namespace: biological_process
is_a: GO:0000002 ! beta

[Term]
id: GO:0000002
name: beta
namespace: biological_process
is_a: GO:0000003 ! gamma

[Term]
id: GO:0000003
name: gamma
namespace: biological_process
"#;

    const GAF_FIXTURE: &str = "!gaf-version: 2.2\n\
UniProtKB\tP10000\tAAA1\t\tGO:0000001\tPMID:100\tIDA\t\tP\talpha protein\t\tprotein\ttaxon:9606\t20260101\tUniProt\t\t\n\
UniProtKB\tP10000\tAAA1\t\tGO:0000002\tGO_REF:0000002\tIEA\t\tP\talpha protein\t\tprotein\ttaxon:9606\t20260101\tUniProt\t\t\n\
UniProtKB\tP20000\tBBB2\tNOT\tGO:0055555\tPMID:200\tIDA\t\tP\tbeta protein\t\tprotein\ttaxon:9606\t20260101\tUniProt\t\t\n";

    async fn test_manager(temp: &TempDir) -> Manager {
        let obo_path = temp.path().join("go-basic.obo");
        std::fs::write(&obo_path, OBO_FIXTURE).unwrap();

        let config = GobelConfig::builder()
            .database_url("sqlite::memory:")
            .cache_dir(temp.path().join("cache"))
            .local_obo_path(&obo_path)
            .build();
        Manager::connect(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_populate_and_query() {
        let temp = TempDir::new().unwrap();
        let manager = test_manager(&temp).await;

        let report = manager.populate(PopulateOptions::default()).await.unwrap();
        assert_eq!(report.version, "2026-04-04");
        assert_eq!(report.term_count, 3);
        assert_eq!(report.relation_count, 2);
        assert!(matches!(
            report.outcome,
            CommitOutcome::Committed { replaced: false, .. }
        ));

        assert!(manager.is_populated().await.unwrap());

        let term = manager.get_term("GO:0000001", None).await.unwrap();
        assert_eq!(term.name, "alpha");

        let ancestors = manager.ancestors("GO:0000001", &[], None).await.unwrap();
        let ids: Vec<&str> = ancestors.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GO:0000002", "GO:0000003"]);

        let descendants = manager.descendants("GO:0000003", &[], None).await.unwrap();
        let ids: Vec<&str> = descendants.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GO:0000002", "GO:0000001"]);
    }

    #[tokio::test]
    async fn test_populate_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let manager = test_manager(&temp).await;

        manager.populate(PopulateOptions::default()).await.unwrap();
        let second = manager.populate(PopulateOptions::default()).await.unwrap();
        assert!(matches!(second.outcome, CommitOutcome::Unchanged { .. }));
    }

    #[tokio::test]
    async fn test_version_override_wins_over_header() {
        let temp = TempDir::new().unwrap();
        let manager = test_manager(&temp).await;

        let report = manager
            .populate(PopulateOptions {
                version: Some("custom-label".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.version, "custom-label");

        let summary = manager.summarize(None).await.unwrap();
        assert_eq!(summary.version, "custom-label");
    }

    #[tokio::test]
    async fn test_missing_release_version_is_an_error() {
        let temp = TempDir::new().unwrap();
        let obo_path = temp.path().join("no-version.obo");
        std::fs::write(
            &obo_path,
            "format-version: 1.2\n\n[Term]\nid: GO:0000001\nname: a\nnamespace: biological_process\n",
        )
        .unwrap();

        let config = GobelConfig::builder()
            .database_url("sqlite::memory:")
            .cache_dir(temp.path().join("cache"))
            .local_obo_path(&obo_path)
            .build();
        let manager = Manager::connect(config).await.unwrap();

        let err = manager.populate(PopulateOptions::default()).await.unwrap_err();
        assert!(matches!(err, ManagerError::MissingVersion(_)));

        // An explicit label makes the same document ingestible
        let report = manager
            .populate(PopulateOptions {
                version: Some("manual".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.version, "manual");
    }

    #[tokio::test]
    async fn test_conflicting_content_rejected_then_overwritten() {
        let temp = TempDir::new().unwrap();
        let obo_path = temp.path().join("go-basic.obo");
        std::fs::write(&obo_path, OBO_FIXTURE).unwrap();

        let config = GobelConfig::builder()
            .database_url("sqlite::memory:")
            .cache_dir(temp.path().join("cache"))
            .local_obo_path(&obo_path)
            .build();
        let manager = Manager::connect(config).await.unwrap();

        manager.populate(PopulateOptions::default()).await.unwrap();

        // Same version label, different content
        std::fs::write(&obo_path, OBO_FIXTURE.replace("name: alpha", "name: renamed")).unwrap();

        let err = manager.populate(PopulateOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Storage(StorageError::VersionConflict { .. })
        ));
        assert_eq!(
            manager.get_term("GO:0000001", None).await.unwrap().name,
            "alpha"
        );

        let report = manager
            .populate(PopulateOptions {
                mode: CommitMode::Overwrite,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(matches!(
            report.outcome,
            CommitOutcome::Committed { replaced: true, .. }
        ));
        assert_eq!(
            manager.get_term("GO:0000001", None).await.unwrap().name,
            "renamed"
        );
    }

    #[tokio::test]
    async fn test_dangling_reference_aborts_without_persisting() {
        let temp = TempDir::new().unwrap();
        let obo_path = temp.path().join("dangling.obo");
        std::fs::write(
            &obo_path,
            "format-version: 1.2\ndata-version: releases/2026-04-04\n\n\
             [Term]\nid: GO:0000001\nname: a\nnamespace: biological_process\nis_a: GO:0009999 ! gone\n",
        )
        .unwrap();

        let config = GobelConfig::builder()
            .database_url("sqlite::memory:")
            .cache_dir(temp.path().join("cache"))
            .local_obo_path(&obo_path)
            .build();
        let manager = Manager::connect(config).await.unwrap();

        let err = manager.populate(PopulateOptions::default()).await.unwrap_err();
        match err {
            ManagerError::Build(BuildError::DanglingReferences(refs)) => {
                assert_eq!(refs.len(), 1);
                assert_eq!(refs[0].target_id, "GO:0009999");
            },
            other => panic!("expected dangling reference error, got {:?}", other),
        }

        assert!(!manager.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn test_annotate_from_local_gaf() {
        let temp = TempDir::new().unwrap();
        let manager = test_manager(&temp).await;
        manager.populate(PopulateOptions::default()).await.unwrap();

        let gaf_path = temp.path().join("goa.gaf");
        std::fs::write(&gaf_path, GAF_FIXTURE).unwrap();

        let report = manager
            .annotate(Some(gaf_path.to_str().unwrap()), None, false)
            .await
            .unwrap();
        assert_eq!(report.version, "2026-04-04");
        assert_eq!(report.rows_parsed, 3);
        assert_eq!(report.stats.annotations_stored, 2);
        // The GO:0055555 row names a term absent from the graph
        assert_eq!(report.stats.annotations_skipped, 1);
        assert_eq!(report.experimental_count, 2);
        assert_eq!(report.electronic_count, 1);

        let summary = manager.summarize(None).await.unwrap();
        assert_eq!(summary.annotation_count, 2);
        assert_eq!(summary.annotated_target_count, 1);

        let term = manager.get_term("GO:0000001", None).await.unwrap();
        assert_eq!(term.annotation_count, 1);
    }

    #[tokio::test]
    async fn test_annotate_requires_populated_graph() {
        let temp = TempDir::new().unwrap();
        let manager = test_manager(&temp).await;

        let err = manager.annotate(None, None, false).await.unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Storage(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_collect_annotations() {
        let records = vec![
            GafRecord {
                db: "UniProtKB".into(),
                db_id: "P1".into(),
                db_symbol: "A".into(),
                qualifier: Some("involved_in".into()),
                go_id: "GO:0000001".into(),
                reference: Some("PMID:123".into()),
                evidence_code: "IDA".into(),
                taxon_id: "9606".into(),
            },
            GafRecord {
                db: "UniProtKB".into(),
                db_id: "P1".into(),
                db_symbol: "A".into(),
                qualifier: None,
                go_id: "GO:0000002".into(),
                reference: Some("unprefixed".into()),
                evidence_code: "IEA".into(),
                taxon_id: "9606".into(),
            },
        ];

        let (targets, annotations) = collect_annotations(&records);
        assert_eq!(targets.len(), 1);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].provenance_db.as_deref(), Some("PMID"));
        assert_eq!(annotations[0].provenance_id.as_deref(), Some("123"));
        assert!(annotations[1].provenance_db.is_none());
        assert_eq!(annotations[1].provenance_id.as_deref(), Some("unprefixed"));
    }
}
