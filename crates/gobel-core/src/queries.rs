// Read-side queries over committed graph versions

use crate::models::{normalize_go_id, RelationKind, Synonym, SynonymScope};
use crate::storage::{Result, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::{BTreeMap, HashSet};

/// Relation kinds traversals follow when the caller does not choose
pub const DEFAULT_TRAVERSAL_KINDS: [RelationKind; 2] =
    [RelationKind::IsA, RelationKind::PartOf];

// ============================================================================
// Response Types
// ============================================================================

/// Full detail for one term lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermDetail {
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub is_obsolete: bool,
    pub synonyms: Vec<Synonym>,
    pub alt_ids: Vec<String>,
    pub annotation_count: i64,
    pub version: String,
    /// Set when the lookup went through a secondary identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_alt_id: Option<String>,
}

/// One term reached during a traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalTerm {
    pub id: String,
    pub name: String,
    /// Distance from the start term (direct neighbors are depth 1)
    pub depth: usize,
}

/// Result of an ancestor or descendant traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalResult {
    pub start: String,
    pub version: String,
    pub kinds: Vec<String>,
    pub terms: Vec<TraversalTerm>,
}

/// Aggregate counts for one committed version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub version: String,
    pub committed_at: DateTime<Utc>,
    pub content_digest: String,
    pub term_count: i64,
    pub obsolete_count: i64,
    pub terms_by_namespace: BTreeMap<String, i64>,
    pub relation_count: i64,
    pub relations_by_kind: BTreeMap<String, i64>,
    pub synonym_count: i64,
    pub alt_id_count: i64,
    pub annotation_count: i64,
    pub annotated_target_count: i64,
}

// ============================================================================
// Version Resolution
// ============================================================================

/// Resolve an optional version label to a stored one
///
/// `None` picks the most recently committed version.
pub async fn resolve_version(pool: &SqlitePool, version: Option<&str>) -> Result<String> {
    match version {
        Some(v) => {
            let found: Option<String> =
                sqlx::query_scalar("SELECT version FROM graph_versions WHERE version = ?1")
                    .bind(v)
                    .fetch_optional(pool)
                    .await?;
            found.ok_or_else(|| StorageError::NotFound(format!("graph version {}", v)))
        },
        None => {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT version FROM graph_versions ORDER BY committed_at DESC, version DESC LIMIT 1",
            )
            .fetch_optional(pool)
            .await?;
            found.ok_or_else(|| StorageError::NotFound("any committed graph version".into()))
        },
    }
}

/// Whether any graph has been committed
pub async fn is_populated(pool: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM graph_versions")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// ============================================================================
// Term Lookups
// ============================================================================

/// Look up a term by identifier, following secondary identifiers
///
/// Bare numeric accessions are accepted and normalized to `GO:` form.
#[tracing::instrument(skip(pool))]
pub async fn get_term(pool: &SqlitePool, id: &str, version: Option<&str>) -> Result<TermDetail> {
    let version = resolve_version(pool, version).await?;
    let id = normalize_go_id(id);

    let mut matched_alt_id = None;
    let mut primary_id = id.clone();

    let exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM terms WHERE version = ?1 AND id = ?2")
            .bind(&version)
            .bind(&id)
            .fetch_optional(pool)
            .await?;

    if exists.is_none() {
        let via_alt: Option<String> =
            sqlx::query_scalar("SELECT term_id FROM term_alt_ids WHERE version = ?1 AND alt_id = ?2")
                .bind(&version)
                .bind(&id)
                .fetch_optional(pool)
                .await?;
        match via_alt {
            Some(term_id) => {
                matched_alt_id = Some(id.clone());
                primary_id = term_id;
            },
            None => {
                return Err(StorageError::NotFound(format!(
                    "term {} in version {}",
                    id, version
                )));
            },
        }
    }

    let mut detail = fetch_term_detail(pool, &primary_id, &version).await?;
    detail.matched_alt_id = matched_alt_id;
    Ok(detail)
}

/// Look up a term by exact name
#[tracing::instrument(skip(pool))]
pub async fn get_term_by_name(
    pool: &SqlitePool,
    name: &str,
    version: Option<&str>,
) -> Result<TermDetail> {
    let version = resolve_version(pool, version).await?;

    let id: Option<String> =
        sqlx::query_scalar("SELECT id FROM terms WHERE version = ?1 AND name = ?2")
            .bind(&version)
            .bind(name)
            .fetch_optional(pool)
            .await?;

    match id {
        Some(id) => fetch_term_detail(pool, &id, &version).await,
        None => Err(StorageError::NotFound(format!(
            "term named {:?} in version {}",
            name, version
        ))),
    }
}

async fn fetch_term_detail(pool: &SqlitePool, id: &str, version: &str) -> Result<TermDetail> {
    let (name, namespace, definition, is_obsolete): (String, String, Option<String>, bool) =
        sqlx::query_as(
            "SELECT name, namespace, definition, is_obsolete FROM terms WHERE version = ?1 AND id = ?2",
        )
        .bind(version)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("term {} in version {}", id, version)))?;

    let synonym_rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT scope, synonym FROM term_synonyms WHERE version = ?1 AND term_id = ?2 ORDER BY synonym",
    )
    .bind(version)
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut synonyms = Vec::with_capacity(synonym_rows.len());
    for (scope, text) in synonym_rows {
        synonyms.push(Synonym {
            scope: SynonymScope::from_str(&scope).map_err(StorageError::Corrupt)?,
            text,
        });
    }

    let alt_ids: Vec<String> = sqlx::query_scalar(
        "SELECT alt_id FROM term_alt_ids WHERE version = ?1 AND term_id = ?2 ORDER BY alt_id",
    )
    .bind(version)
    .bind(id)
    .fetch_all(pool)
    .await?;

    let annotation_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM annotations WHERE version = ?1 AND term_id = ?2",
    )
    .bind(version)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(TermDetail {
        id: id.to_string(),
        name,
        namespace,
        definition,
        is_obsolete,
        synonyms,
        alt_ids,
        annotation_count,
        version: version.to_string(),
        matched_alt_id: None,
    })
}

// ============================================================================
// Traversals
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TraversalDirection {
    /// Follow source -> target edges (towards more general terms)
    Up,
    /// Follow target -> source edges (towards more specific terms)
    Down,
}

/// Terms reachable by walking relations towards more general terms
///
/// Breadth-first over the stored edges, restricted to the given kinds,
/// deduplicated, the start term excluded. Obsolete terms never appear in
/// the result. Within a level terms are ordered by identifier.
#[tracing::instrument(skip(pool))]
pub async fn query_ancestors(
    pool: &SqlitePool,
    id: &str,
    kinds: &[RelationKind],
    version: Option<&str>,
) -> Result<TraversalResult> {
    traverse(pool, id, kinds, version, TraversalDirection::Up).await
}

/// Terms reachable by walking relations towards more specific terms
#[tracing::instrument(skip(pool))]
pub async fn query_descendants(
    pool: &SqlitePool,
    id: &str,
    kinds: &[RelationKind],
    version: Option<&str>,
) -> Result<TraversalResult> {
    traverse(pool, id, kinds, version, TraversalDirection::Down).await
}

async fn traverse(
    pool: &SqlitePool,
    id: &str,
    kinds: &[RelationKind],
    version: Option<&str>,
    direction: TraversalDirection,
) -> Result<TraversalResult> {
    // Validates existence and resolves secondary ids
    let start = get_term(pool, id, version).await?;
    let version = start.version.clone();

    let mut result = TraversalResult {
        start: start.id.clone(),
        version: version.clone(),
        kinds: kinds.iter().map(|k| k.as_str().to_string()).collect(),
        terms: Vec::new(),
    };

    if kinds.is_empty() {
        return Ok(result);
    }

    let (from_column, to_column) = match direction {
        TraversalDirection::Up => ("source_id", "target_id"),
        TraversalDirection::Down => ("target_id", "source_id"),
    };

    let mut visited: HashSet<String> = HashSet::from([start.id.clone()]);
    let mut frontier: Vec<String> = vec![start.id];
    let mut depth = 0usize;

    while !frontier.is_empty() {
        depth += 1;

        let rows = {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT DISTINCT tr.");
            qb.push(to_column)
                .push(", t.name FROM term_relations tr JOIN terms t ON t.id = tr.")
                .push(to_column)
                .push(" AND t.version = tr.version WHERE t.is_obsolete = 0 AND tr.version = ")
                .push_bind(&version)
                .push(" AND tr.kind IN (");
            {
                let mut sep = qb.separated(", ");
                for kind in kinds {
                    sep.push_bind(kind.as_str());
                }
            }
            qb.push(") AND tr.").push(from_column).push(" IN (");
            {
                let mut sep = qb.separated(", ");
                for id in &frontier {
                    sep.push_bind(id.as_str());
                }
            }
            qb.push(")");

            qb.build_query_as::<(String, String)>().fetch_all(pool).await?
        };

        frontier.clear();

        let mut level: Vec<(String, String)> = rows
            .into_iter()
            .filter(|(id, _)| !visited.contains(id))
            .collect();
        level.sort();
        level.dedup();

        for (id, name) in level {
            visited.insert(id.clone());
            frontier.push(id.clone());
            result.terms.push(TraversalTerm { id, name, depth });
        }
    }

    Ok(result)
}

// ============================================================================
// Summary
// ============================================================================

/// Aggregate counts for one version of the stored graph
#[tracing::instrument(skip(pool))]
pub async fn summarize(pool: &SqlitePool, version: Option<&str>) -> Result<GraphSummary> {
    let version = resolve_version(pool, version).await?;

    let (content_digest, committed_at): (String, DateTime<Utc>) = sqlx::query_as(
        "SELECT content_digest, committed_at FROM graph_versions WHERE version = ?1",
    )
    .bind(&version)
    .fetch_one(pool)
    .await?;

    let namespace_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT namespace, COUNT(*) FROM terms WHERE version = ?1 GROUP BY namespace",
    )
    .bind(&version)
    .fetch_all(pool)
    .await?;

    let kind_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT kind, COUNT(*) FROM term_relations WHERE version = ?1 GROUP BY kind",
    )
    .bind(&version)
    .fetch_all(pool)
    .await?;

    let term_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terms WHERE version = ?1")
        .bind(&version)
        .fetch_one(pool)
        .await?;

    let obsolete_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM terms WHERE version = ?1 AND is_obsolete = 1")
            .bind(&version)
            .fetch_one(pool)
            .await?;

    let relation_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM term_relations WHERE version = ?1")
            .bind(&version)
            .fetch_one(pool)
            .await?;

    let synonym_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM term_synonyms WHERE version = ?1")
            .bind(&version)
            .fetch_one(pool)
            .await?;

    let alt_id_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM term_alt_ids WHERE version = ?1")
            .bind(&version)
            .fetch_one(pool)
            .await?;

    let annotation_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM annotations WHERE version = ?1")
            .bind(&version)
            .fetch_one(pool)
            .await?;

    let annotated_target_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT target_id) FROM annotations WHERE version = ?1",
    )
    .bind(&version)
    .fetch_one(pool)
    .await?;

    Ok(GraphSummary {
        version,
        committed_at,
        content_digest,
        term_count,
        obsolete_count,
        terms_by_namespace: namespace_rows.into_iter().collect(),
        relation_count,
        relations_by_kind: kind_rows.into_iter().collect(),
        synonym_count,
        alt_id_count,
        annotation_count,
        annotated_target_count,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::models::{Annotation, AnnotationTarget, EvidenceCode};
    use crate::parser::OboParser;
    use crate::storage::{init_schema, CommitMode, GraphStore};
    use sqlx::sqlite::SqlitePoolOptions;

    const FIXTURE: &str = r#"format-version: 1.2
data-version: releases/2026-03-03

[Term]
id: GO:0000001
name: starting point
namespace: biological_process
def: "Where traversal begins." [GOC:test]
alt_id: GO:0090001
synonym: "origin" EXACT []
is_a: GO:0000002 ! middle

[Term]
id: GO:0000002
name: middle
namespace: biological_process
is_a: GO:0000003 ! top
relationship: part_of GO:0000004 ! side

[Term]
id: GO:0000003
name: top
namespace: biological_process

[Term]
id: GO:0000004
name: side
namespace: biological_process

[Term]
id: GO:0000005
name: retired
namespace: biological_process
is_obsolete: true
"#;

    async fn populated_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();

        let graph = GraphBuilder::build(OboParser::parse(FIXTURE, None)).unwrap();
        let store = GraphStore::new(pool.clone());
        store.commit(&graph, "2026-03-03", CommitMode::Reject).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_term() {
        let pool = populated_pool().await;

        let term = get_term(&pool, "GO:0000001", None).await.unwrap();
        assert_eq!(term.name, "starting point");
        assert_eq!(term.namespace, "biological_process");
        assert_eq!(term.definition.as_deref(), Some("Where traversal begins."));
        assert_eq!(term.synonyms.len(), 1);
        assert_eq!(term.alt_ids, vec!["GO:0090001".to_string()]);
        assert!(term.matched_alt_id.is_none());

        // Bare accessions are normalized
        let term = get_term(&pool, "0000003", None).await.unwrap();
        assert_eq!(term.name, "top");
    }

    #[tokio::test]
    async fn test_get_term_via_alt_id() {
        let pool = populated_pool().await;

        let term = get_term(&pool, "GO:0090001", None).await.unwrap();
        assert_eq!(term.id, "GO:0000001");
        assert_eq!(term.matched_alt_id.as_deref(), Some("GO:0090001"));
    }

    #[tokio::test]
    async fn test_get_term_not_found() {
        let pool = populated_pool().await;

        let err = get_term(&pool, "GO:0077777", None).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let err = get_term(&pool, "GO:0000001", Some("2020-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_term_by_name() {
        let pool = populated_pool().await;

        let term = get_term_by_name(&pool, "middle", None).await.unwrap();
        assert_eq!(term.id, "GO:0000002");

        let err = get_term_by_name(&pool, "no such term", None).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ancestors_follow_is_a_chain() {
        let pool = populated_pool().await;

        let result = query_ancestors(&pool, "GO:0000001", &[RelationKind::IsA], None)
            .await
            .unwrap();
        assert_eq!(
            result.terms,
            vec![
                TraversalTerm {
                    id: "GO:0000002".into(),
                    name: "middle".into(),
                    depth: 1,
                },
                TraversalTerm {
                    id: "GO:0000003".into(),
                    name: "top".into(),
                    depth: 2,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_descendants_mirror_ancestors() {
        let pool = populated_pool().await;

        let result = query_descendants(&pool, "GO:0000003", &[RelationKind::IsA], None)
            .await
            .unwrap();
        let ids: Vec<&str> = result.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GO:0000002", "GO:0000001"]);
    }

    #[tokio::test]
    async fn test_traversal_respects_kinds() {
        let pool = populated_pool().await;

        let is_a_only = query_ancestors(&pool, "GO:0000002", &[RelationKind::IsA], None)
            .await
            .unwrap();
        let ids: Vec<&str> = is_a_only.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GO:0000003"]);

        let both = query_ancestors(&pool, "GO:0000002", &DEFAULT_TRAVERSAL_KINDS, None)
            .await
            .unwrap();
        let ids: Vec<&str> = both.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GO:0000003", "GO:0000004"]);
    }

    #[tokio::test]
    async fn test_traversal_from_unknown_term() {
        let pool = populated_pool().await;
        let err = query_ancestors(&pool, "GO:0012345", &DEFAULT_TRAVERSAL_KINDS, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_traversal_starts_from_alt_id() {
        let pool = populated_pool().await;
        let result = query_ancestors(&pool, "GO:0090001", &[RelationKind::IsA], None)
            .await
            .unwrap();
        assert_eq!(result.start, "GO:0000001");
        assert_eq!(result.terms.len(), 2);
    }

    #[tokio::test]
    async fn test_summarize() {
        let pool = populated_pool().await;
        let store = GraphStore::new(pool.clone());

        let target = AnnotationTarget {
            db: "UniProtKB".into(),
            db_id: "P99999".into(),
            db_symbol: "ABC1".into(),
            taxon_id: "9606".into(),
        };
        let annotation = Annotation {
            go_id: "GO:0000002".into(),
            db: "UniProtKB".into(),
            db_id: "P99999".into(),
            qualifier: None,
            provenance_db: Some("PMID".into()),
            provenance_id: Some("777".into()),
            evidence_code: EvidenceCode("IDA".into()),
        };
        store
            .commit_annotations("2026-03-03", &[target], &[annotation])
            .await
            .unwrap();

        let summary = summarize(&pool, None).await.unwrap();
        assert_eq!(summary.version, "2026-03-03");
        assert_eq!(summary.term_count, 5);
        assert_eq!(summary.obsolete_count, 1);
        assert_eq!(summary.relation_count, 3);
        assert_eq!(summary.terms_by_namespace.get("biological_process"), Some(&5));
        assert_eq!(summary.relations_by_kind.get("is_a"), Some(&2));
        assert_eq!(summary.relations_by_kind.get("part_of"), Some(&1));
        assert_eq!(summary.synonym_count, 1);
        assert_eq!(summary.alt_id_count, 1);
        assert_eq!(summary.annotation_count, 1);
        assert_eq!(summary.annotated_target_count, 1);
    }

    #[tokio::test]
    async fn test_resolve_version_latest() {
        let pool = populated_pool().await;
        assert_eq!(resolve_version(&pool, None).await.unwrap(), "2026-03-03");
        assert!(is_populated(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_database() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();

        assert!(!is_populated(&pool).await.unwrap());
        let err = resolve_version(&pool, None).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
