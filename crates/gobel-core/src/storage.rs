// Versioned graph persistence over SQLite

use crate::graph::OntologyGraph;
use crate::models::{Annotation, AnnotationTarget, Relation, RelationKind, Term};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StorageError>;

// Bind counts per row stay well under the SQLite variable limit
const TERM_CHUNK_SIZE: usize = 500;
const RELATION_CHUNK_SIZE: usize = 800;
const SYNONYM_CHUNK_SIZE: usize = 800;
const ALT_ID_CHUNK_SIZE: usize = 1000;
const TARGET_CHUNK_SIZE: usize = 500;
const ANNOTATION_CHUNK_SIZE: usize = 400;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum StorageError {
    /// The version label exists with different content and overwrite was
    /// not requested
    #[error("version {version} is already committed with different content")]
    VersionConflict { version: String },

    #[error("{0} not found")]
    NotFound(String),

    /// A stored enum value no longer parses; indicates external tampering
    /// or a schema mismatch
    #[error("invalid stored value: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ============================================================================
// Pool and Schema
// ============================================================================

/// Open (and create if missing) a SQLite database at the given URL
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every pooled connection to :memory: would be a distinct database
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Initialize the database schema (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS graph_versions (
            id TEXT PRIMARY KEY,
            version TEXT NOT NULL UNIQUE,
            term_count INTEGER NOT NULL,
            relation_count INTEGER NOT NULL,
            content_digest TEXT NOT NULL,
            committed_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terms (
            id TEXT NOT NULL,
            version TEXT NOT NULL,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            definition TEXT,
            is_obsolete BOOLEAN NOT NULL DEFAULT 0,
            PRIMARY KEY (id, version),
            FOREIGN KEY (version) REFERENCES graph_versions(version) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term_relations (
            source_id TEXT NOT NULL,
            target_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            version TEXT NOT NULL,
            UNIQUE (source_id, target_id, kind, version),
            FOREIGN KEY (source_id, version) REFERENCES terms(id, version) ON DELETE CASCADE,
            FOREIGN KEY (target_id, version) REFERENCES terms(id, version) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term_synonyms (
            term_id TEXT NOT NULL,
            version TEXT NOT NULL,
            scope TEXT NOT NULL,
            synonym TEXT NOT NULL,
            UNIQUE (term_id, version, scope, synonym),
            FOREIGN KEY (term_id, version) REFERENCES terms(id, version) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term_alt_ids (
            alt_id TEXT NOT NULL,
            term_id TEXT NOT NULL,
            version TEXT NOT NULL,
            UNIQUE (alt_id, version),
            FOREIGN KEY (term_id, version) REFERENCES terms(id, version) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_targets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            db TEXT NOT NULL,
            db_id TEXT NOT NULL,
            db_symbol TEXT NOT NULL DEFAULT '',
            taxon_id TEXT NOT NULL DEFAULT '',
            UNIQUE (db, db_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Optional annotation fields are stored as empty strings so the
    // uniqueness constraint deduplicates them (SQLite treats NULLs as
    // distinct in unique indexes)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            version TEXT NOT NULL,
            term_id TEXT NOT NULL,
            target_id INTEGER NOT NULL,
            qualifier TEXT NOT NULL DEFAULT '',
            provenance_db TEXT NOT NULL DEFAULT '',
            provenance_id TEXT NOT NULL DEFAULT '',
            evidence_code TEXT NOT NULL,
            UNIQUE (version, term_id, target_id, qualifier, provenance_db, provenance_id, evidence_code),
            FOREIGN KEY (term_id, version) REFERENCES terms(id, version) ON DELETE CASCADE,
            FOREIGN KEY (target_id) REFERENCES annotation_targets(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_terms_name ON terms(version, name)",
        "CREATE INDEX IF NOT EXISTS idx_relations_source ON term_relations(version, source_id)",
        "CREATE INDEX IF NOT EXISTS idx_relations_target ON term_relations(version, target_id)",
        "CREATE INDEX IF NOT EXISTS idx_synonyms_term ON term_synonyms(version, term_id)",
        "CREATE INDEX IF NOT EXISTS idx_annotations_term ON annotations(version, term_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

// ============================================================================
// Commit Types
// ============================================================================

/// How to treat a version label that already exists with other content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Fail with `VersionConflict`, keeping the stored graph
    #[default]
    Reject,
    /// Replace the stored graph under the same label
    Overwrite,
}

/// Result of committing a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        version: String,
        terms_stored: usize,
        relations_stored: usize,
        /// True when an existing graph under this label was replaced
        replaced: bool,
    },
    /// The label already holds identical content; nothing was written
    Unchanged { version: String },
}

/// Result of committing annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationStats {
    pub targets_stored: usize,
    pub annotations_stored: usize,
    /// GAF rows referring to identifiers absent from the graph
    pub annotations_skipped: usize,
}

/// One row of the version registry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VersionRecord {
    pub id: String,
    pub version: String,
    pub term_count: i64,
    pub relation_count: i64,
    pub content_digest: String,
    pub committed_at: DateTime<Utc>,
}

// ============================================================================
// Graph Store
// ============================================================================

/// Persistence adapter for ontology graphs
#[derive(Clone)]
pub struct GraphStore {
    pool: SqlitePool,
}

impl GraphStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Commit a graph under a version label
    ///
    /// Committing the same content under the same label twice is a no-op.
    /// A label that exists with different content either fails
    /// (`CommitMode::Reject`) or is replaced atomically
    /// (`CommitMode::Overwrite`). Concurrent committers of the same label
    /// are serialized by the unique constraint on `graph_versions.version`:
    /// exactly one insert wins and the others observe its row.
    pub async fn commit(
        &self,
        graph: &OntologyGraph,
        version: &str,
        mode: CommitMode,
    ) -> Result<CommitOutcome> {
        let digest = graph.content_digest();
        info!(
            "Committing graph version {}: {} terms, {} relations",
            version,
            graph.term_count(),
            graph.relation_count()
        );

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO graph_versions (id, version, term_count, relation_count, content_digest, committed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (version) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(version)
        .bind(graph.term_count() as i64)
        .bind(graph.relation_count() as i64)
        .bind(&digest)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            // Someone committed this label before us; compare content
            let existing: String =
                sqlx::query_scalar("SELECT content_digest FROM graph_versions WHERE version = ?1")
                    .bind(version)
                    .fetch_one(&mut *tx)
                    .await?;

            if existing == digest {
                info!("Version {} already holds identical content, no-op", version);
                return Ok(CommitOutcome::Unchanged {
                    version: version.to_string(),
                });
            }

            match mode {
                CommitMode::Reject => {
                    return Err(StorageError::VersionConflict {
                        version: version.to_string(),
                    });
                },
                CommitMode::Overwrite => {
                    warn!("Overwriting version {} with different content", version);
                    self.delete_version_content(&mut tx, version).await?;
                    sqlx::query(
                        r#"
                        UPDATE graph_versions
                        SET term_count = ?1, relation_count = ?2, content_digest = ?3, committed_at = ?4
                        WHERE version = ?5
                        "#,
                    )
                    .bind(graph.term_count() as i64)
                    .bind(graph.relation_count() as i64)
                    .bind(&digest)
                    .bind(Utc::now())
                    .bind(version)
                    .execute(&mut *tx)
                    .await?;

                    self.insert_graph_content(&mut tx, graph, version).await?;
                    tx.commit().await?;

                    return Ok(CommitOutcome::Committed {
                        version: version.to_string(),
                        terms_stored: graph.term_count(),
                        relations_stored: graph.relation_count(),
                        replaced: true,
                    });
                },
            }
        }

        self.insert_graph_content(&mut tx, graph, version).await?;
        tx.commit().await?;

        info!(
            "Committed version {}: {} terms, {} relations",
            version,
            graph.term_count(),
            graph.relation_count()
        );

        Ok(CommitOutcome::Committed {
            version: version.to_string(),
            terms_stored: graph.term_count(),
            relations_stored: graph.relation_count(),
            replaced: false,
        })
    }

    /// Load a committed graph; `None` loads the most recently committed one
    pub async fn load(&self, version: Option<&str>) -> Result<OntologyGraph> {
        let record = match version {
            Some(v) => self.get_version(v).await?,
            None => self
                .latest_version()
                .await?
                .ok_or_else(|| StorageError::NotFound("any committed graph version".into()))?,
        };

        let term_rows: Vec<(String, String, String, Option<String>, bool)> = sqlx::query_as(
            "SELECT id, name, namespace, definition, is_obsolete FROM terms WHERE version = ?1",
        )
        .bind(&record.version)
        .fetch_all(&self.pool)
        .await?;

        let synonym_rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT term_id, scope, synonym FROM term_synonyms WHERE version = ?1",
        )
        .bind(&record.version)
        .fetch_all(&self.pool)
        .await?;

        let alt_rows: Vec<(String, String)> =
            sqlx::query_as("SELECT alt_id, term_id FROM term_alt_ids WHERE version = ?1")
                .bind(&record.version)
                .fetch_all(&self.pool)
                .await?;

        let relation_rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT source_id, target_id, kind FROM term_relations WHERE version = ?1",
        )
        .bind(&record.version)
        .fetch_all(&self.pool)
        .await?;

        let mut synonyms_by_term: HashMap<String, Vec<crate::models::Synonym>> = HashMap::new();
        for (term_id, scope, text) in synonym_rows {
            let scope = crate::models::SynonymScope::from_str(&scope)
                .map_err(StorageError::Corrupt)?;
            synonyms_by_term
                .entry(term_id)
                .or_default()
                .push(crate::models::Synonym { scope, text });
        }

        let mut alt_ids_by_term: HashMap<String, Vec<String>> = HashMap::new();
        for (alt_id, term_id) in alt_rows {
            alt_ids_by_term.entry(term_id).or_default().push(alt_id);
        }

        let mut terms = Vec::with_capacity(term_rows.len());
        for (id, name, namespace, definition, is_obsolete) in term_rows {
            terms.push(Term {
                namespace: crate::models::Namespace::from_str(&namespace)
                    .map_err(StorageError::Corrupt)?,
                synonyms: synonyms_by_term.remove(&id).unwrap_or_default(),
                alt_ids: alt_ids_by_term.remove(&id).unwrap_or_default(),
                id,
                name,
                definition,
                is_obsolete,
            });
        }

        let mut relations = Vec::with_capacity(relation_rows.len());
        for (source_id, target_id, kind) in relation_rows {
            relations.push(Relation {
                source_id,
                target_id,
                kind: RelationKind::from_str(&kind).map_err(StorageError::Corrupt)?,
            });
        }

        Ok(OntologyGraph::from_parts(
            Some(record.version),
            terms,
            relations,
        ))
    }

    /// Registry row for one version, or `NotFound`
    pub async fn get_version(&self, version: &str) -> Result<VersionRecord> {
        sqlx::query_as::<_, VersionRecord>(
            r#"
            SELECT id, version, term_count, relation_count, content_digest, committed_at
            FROM graph_versions
            WHERE version = ?1
            "#,
        )
        .bind(version)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("graph version {}", version)))
    }

    /// Most recently committed version, if any
    pub async fn latest_version(&self) -> Result<Option<VersionRecord>> {
        let record = sqlx::query_as::<_, VersionRecord>(
            r#"
            SELECT id, version, term_count, relation_count, content_digest, committed_at
            FROM graph_versions
            ORDER BY committed_at DESC, version DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// All committed versions, newest first
    pub async fn list_versions(&self) -> Result<Vec<VersionRecord>> {
        let records = sqlx::query_as::<_, VersionRecord>(
            r#"
            SELECT id, version, term_count, relation_count, content_digest, committed_at
            FROM graph_versions
            ORDER BY committed_at DESC, version DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Store gene product annotations against a committed graph version
    ///
    /// Existing annotations for the version are replaced. Identifiers are
    /// resolved through the version's terms and secondary ids; rows naming
    /// unknown identifiers are skipped with a warning.
    pub async fn commit_annotations(
        &self,
        version: &str,
        targets: &[AnnotationTarget],
        annotations: &[Annotation],
    ) -> Result<AnnotationStats> {
        // The graph must exist before annotations can point into it
        self.get_version(version).await?;

        let resolver = self.build_term_resolver(version).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM annotations WHERE version = ?1")
            .bind(version)
            .execute(&mut *tx)
            .await?;

        for chunk in targets.chunks(TARGET_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO annotation_targets (db, db_id, db_symbol, taxon_id) ",
            );
            qb.push_values(chunk, |mut b, target| {
                b.push_bind(&target.db)
                    .push_bind(&target.db_id)
                    .push_bind(&target.db_symbol)
                    .push_bind(&target.taxon_id);
            });
            qb.push(
                r#"
                ON CONFLICT (db, db_id) DO UPDATE SET
                    db_symbol = excluded.db_symbol,
                    taxon_id = excluded.taxon_id
                "#,
            );
            qb.build().execute(&mut *tx).await?;
        }

        let target_ids = self.build_target_lookup(&mut tx).await?;

        let mut stored = 0usize;
        let mut skipped = 0usize;
        let mut resolved: Vec<(String, i64, &Annotation)> = Vec::with_capacity(annotations.len());

        for annotation in annotations {
            let Some(term_id) = resolver.resolve(&annotation.go_id) else {
                warn!(
                    "Annotation names unknown identifier {}, skipping",
                    annotation.go_id
                );
                skipped += 1;
                continue;
            };
            let Some(&target_id) = target_ids.get(&(annotation.db.clone(), annotation.db_id.clone()))
            else {
                warn!(
                    "Annotation target {}:{} was not registered, skipping",
                    annotation.db, annotation.db_id
                );
                skipped += 1;
                continue;
            };
            resolved.push((term_id.to_string(), target_id, annotation));
        }

        for chunk in resolved.chunks(ANNOTATION_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                r#"
                INSERT INTO annotations
                    (version, term_id, target_id, qualifier, provenance_db, provenance_id, evidence_code)
                "#,
            );
            qb.push_values(chunk, |mut b, (term_id, target_id, annotation)| {
                b.push_bind(version)
                    .push_bind(term_id)
                    .push_bind(target_id)
                    .push_bind(annotation.qualifier.as_deref().unwrap_or(""))
                    .push_bind(annotation.provenance_db.as_deref().unwrap_or(""))
                    .push_bind(annotation.provenance_id.as_deref().unwrap_or(""))
                    .push_bind(&annotation.evidence_code.0);
            });
            qb.push(" ON CONFLICT DO NOTHING");
            let result = qb.build().execute(&mut *tx).await?;
            stored += result.rows_affected() as usize;
        }

        tx.commit().await?;

        info!(
            "Stored {} annotations for version {} ({} skipped)",
            stored, version, skipped
        );

        Ok(AnnotationStats {
            targets_stored: targets.len(),
            annotations_stored: stored,
            annotations_skipped: skipped,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn insert_graph_content(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        graph: &OntologyGraph,
        version: &str,
    ) -> Result<()> {
        let terms: Vec<&Term> = graph.terms().collect();

        for chunk in terms.chunks(TERM_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO terms (id, version, name, namespace, definition, is_obsolete) ",
            );
            qb.push_values(chunk, |mut b, term| {
                b.push_bind(&term.id)
                    .push_bind(version)
                    .push_bind(&term.name)
                    .push_bind(term.namespace.as_str())
                    .push_bind(&term.definition)
                    .push_bind(term.is_obsolete);
            });
            qb.build().execute(&mut **tx).await?;
        }

        let synonyms: Vec<(&str, &crate::models::Synonym)> = terms
            .iter()
            .flat_map(|t| t.synonyms.iter().map(move |s| (t.id.as_str(), s)))
            .collect();

        for chunk in synonyms.chunks(SYNONYM_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO term_synonyms (term_id, version, scope, synonym) ",
            );
            qb.push_values(chunk, |mut b, (term_id, synonym)| {
                b.push_bind(*term_id)
                    .push_bind(version)
                    .push_bind(synonym.scope.as_str())
                    .push_bind(&synonym.text);
            });
            qb.push(" ON CONFLICT DO NOTHING");
            qb.build().execute(&mut **tx).await?;
        }

        let alt_ids: Vec<(&str, &str)> = terms
            .iter()
            .flat_map(|t| t.alt_ids.iter().map(move |a| (a.as_str(), t.id.as_str())))
            .collect();

        for chunk in alt_ids.chunks(ALT_ID_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO term_alt_ids (alt_id, term_id, version) ",
            );
            qb.push_values(chunk, |mut b, (alt_id, term_id)| {
                b.push_bind(*alt_id).push_bind(*term_id).push_bind(version);
            });
            qb.push(" ON CONFLICT DO NOTHING");
            qb.build().execute(&mut **tx).await?;
        }

        for chunk in graph.relations().chunks(RELATION_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO term_relations (source_id, target_id, kind, version) ",
            );
            qb.push_values(chunk, |mut b, relation: &Relation| {
                b.push_bind(&relation.source_id)
                    .push_bind(&relation.target_id)
                    .push_bind(relation.kind.as_str())
                    .push_bind(version);
            });
            qb.push(" ON CONFLICT DO NOTHING");
            qb.build().execute(&mut **tx).await?;
        }

        Ok(())
    }

    /// Delete one version's graph rows, children first
    async fn delete_version_content(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version: &str,
    ) -> Result<()> {
        for statement in [
            "DELETE FROM annotations WHERE version = ?1",
            "DELETE FROM term_relations WHERE version = ?1",
            "DELETE FROM term_synonyms WHERE version = ?1",
            "DELETE FROM term_alt_ids WHERE version = ?1",
            "DELETE FROM terms WHERE version = ?1",
        ] {
            sqlx::query(statement).bind(version).execute(&mut **tx).await?;
        }
        Ok(())
    }

    /// Primary id and secondary id lookup for one stored version
    async fn build_term_resolver(&self, version: &str) -> Result<TermResolver> {
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM terms WHERE version = ?1")
            .bind(version)
            .fetch_all(&self.pool)
            .await?;

        let alt_ids: Vec<(String, String)> =
            sqlx::query_as("SELECT alt_id, term_id FROM term_alt_ids WHERE version = ?1")
                .bind(version)
                .fetch_all(&self.pool)
                .await?;

        Ok(TermResolver {
            primary: ids.into_iter().map(|(id,)| id).collect(),
            secondary: alt_ids.into_iter().collect(),
        })
    }

    async fn build_target_lookup(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<HashMap<(String, String), i64>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, db, db_id FROM annotation_targets")
                .fetch_all(&mut **tx)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, db, db_id)| ((db, db_id), id))
            .collect())
    }
}

struct TermResolver {
    primary: std::collections::HashSet<String>,
    secondary: HashMap<String, String>,
}

impl TermResolver {
    fn resolve<'a>(&'a self, id: &'a str) -> Option<&'a str> {
        if self.primary.contains(id) {
            return Some(id);
        }
        self.secondary.get(id).map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
