// Ontology Ingestion Integration Test

use gobel_core::{
    GobelConfig, GraphBuilder, Manager, OboParser, PopulateOptions, RelationKind,
};
use tempfile::TempDir;

const OBO_FIXTURE: &str = r#"format-version: 1.2
data-version: releases/2026-01-01
ontology: go

[Term]
id: GO:0008150
name: biological_process
namespace: biological_process
def: "A biological process represents a specific objective that the organism is genetically programmed to achieve." [GOC:go_curators]
synonym: "biological process" EXACT []
synonym: "physiological process" NARROW []

[Term]
id: GO:0002376
name: immune system process
namespace: biological_process
def: "Any process involved in the development or functioning of the immune system." [GOC:go_curators]
is_a: GO:0008150 ! biological_process

[Term]
id: GO:0006955
name: immune response
namespace: biological_process
is_a: GO:0002376 ! immune system process

[Term]
id: GO:0005575
name: cellular_component
namespace: cellular_component

[Term]
id: GO:0005622
name: intracellular anatomical structure
namespace: cellular_component
relationship: part_of GO:0005575 ! cellular_component

[Term]
id: GO:0003674
name: molecular_function
namespace: molecular_function
"#;

const GAF_FIXTURE: &str = "!gaf-version: 2.2\n\
UniProtKB\tP01308\tINS\t\tGO:0006955\tPMID:12345678\tIDA\t\tP\tinsulin\t\tprotein\ttaxon:9606\t20260115\tUniProt\t\t\n\
UniProtKB\tP01308\tINS\tNOT\tGO:0008150\tGO_REF:0000043\tIEA\t\tP\tinsulin\t\tprotein\ttaxon:9606\t20260115\tUniProt\t\t\n";

async fn connected_manager(temp: &TempDir) -> Manager {
    let obo_path = temp.path().join("go-basic.obo");
    std::fs::write(&obo_path, OBO_FIXTURE).unwrap();

    let config = GobelConfig::builder()
        .database_url("sqlite::memory:")
        .cache_dir(temp.path().join("cache"))
        .local_obo_path(&obo_path)
        .build();
    Manager::connect(config).await.unwrap()
}

#[test]
fn test_parse_and_build_through_public_api() {
    let document = OboParser::parse(OBO_FIXTURE, None);
    assert_eq!(document.header.release_version().as_deref(), Some("2026-01-01"));
    assert_eq!(document.records().count(), 6);
    assert!(document.warnings.is_empty());

    let graph = GraphBuilder::build(document).unwrap();
    assert_eq!(graph.version(), Some("2026-01-01"));
    assert_eq!(graph.term_count(), 6);
    assert_eq!(graph.relation_count(), 3);

    // Verify a term with two synonyms survived
    let root = graph.get_term("GO:0008150").unwrap();
    assert_eq!(root.name, "biological_process");
    assert_eq!(root.synonyms.len(), 2);

    // is_a chain walks to the namespace root
    assert_eq!(
        graph.ancestors("GO:0006955", &[RelationKind::IsA]),
        vec!["GO:0002376".to_string(), "GO:0008150".to_string()]
    );

    // relationship: part_of lines become part_of edges
    assert_eq!(
        graph.ancestors("GO:0005622", &[RelationKind::PartOf]),
        vec!["GO:0005575".to_string()]
    );

    // The digest depends only on content
    let again = GraphBuilder::build(OboParser::parse(OBO_FIXTURE, None)).unwrap();
    assert_eq!(graph.content_digest(), again.content_digest());
}

#[tokio::test]
async fn test_populate_query_flow() {
    let temp = TempDir::new().unwrap();
    let manager = connected_manager(&temp).await;

    let report = manager.populate(PopulateOptions::default()).await.unwrap();
    assert_eq!(report.version, "2026-01-01");
    assert_eq!(report.term_count, 6);
    assert_eq!(report.relation_count, 3);
    assert_eq!(report.warning_count, 0);

    // Per-namespace and per-kind tallies
    let summary = manager.summarize(None).await.unwrap();
    assert_eq!(summary.term_count, 6);
    assert_eq!(summary.obsolete_count, 0);
    assert_eq!(summary.terms_by_namespace.get("biological_process"), Some(&3));
    assert_eq!(summary.terms_by_namespace.get("cellular_component"), Some(&2));
    assert_eq!(summary.terms_by_namespace.get("molecular_function"), Some(&1));
    assert_eq!(summary.relations_by_kind.get("is_a"), Some(&2));
    assert_eq!(summary.relations_by_kind.get("part_of"), Some(&1));

    // Default traversal kinds cover is_a and part_of
    let ancestors = manager.ancestors("GO:0006955", &[], None).await.unwrap();
    let ids: Vec<&str> = ancestors.terms.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["GO:0002376", "GO:0008150"]);

    let descendants = manager.descendants("GO:0005575", &[], None).await.unwrap();
    let ids: Vec<&str> = descendants.terms.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["GO:0005622"]);

    // A committed graph loads back with its synonyms intact
    let graph = manager.load_graph(None).await.unwrap();
    assert_eq!(graph.term_count(), 6);
    assert_eq!(graph.get_term("GO:0008150").unwrap().synonyms.len(), 2);
}

#[tokio::test]
async fn test_annotation_flow() {
    let temp = TempDir::new().unwrap();
    let manager = connected_manager(&temp).await;
    manager.populate(PopulateOptions::default()).await.unwrap();

    let gaf_path = temp.path().join("goa_human.gaf");
    std::fs::write(&gaf_path, GAF_FIXTURE).unwrap();

    let report = manager
        .annotate(Some(gaf_path.to_str().unwrap()), None, false)
        .await
        .unwrap();
    assert_eq!(report.version, "2026-01-01");
    assert_eq!(report.rows_parsed, 2);
    assert_eq!(report.rows_skipped, 0);
    assert_eq!(report.stats.targets_stored, 1);
    assert_eq!(report.stats.annotations_stored, 2);
    assert_eq!(report.experimental_count, 1);
    assert_eq!(report.electronic_count, 1);

    let term = manager.get_term("GO:0006955", None).await.unwrap();
    assert_eq!(term.annotation_count, 1);

    let summary = manager.summarize(None).await.unwrap();
    assert_eq!(summary.annotation_count, 2);
    assert_eq!(summary.annotated_target_count, 1);
}
