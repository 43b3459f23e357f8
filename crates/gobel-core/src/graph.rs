// Ontology graph construction and validation

use crate::models::{Namespace, Relation, RelationKind, Term};
use crate::parser::{OboDocument, ParseWarning, RelationDecl, TermOutcome};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, BuildError>;

// ============================================================================
// Build Errors
// ============================================================================

/// A relation whose target never appeared in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub source_id: String,
    pub kind: RelationKind,
    pub target_id: String,
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source_id, self.kind, self.target_id)
    }
}

fn format_dangling(refs: &[DanglingReference]) -> String {
    refs.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that abort graph construction
#[derive(Error, Debug)]
pub enum BuildError {
    /// A term stanza without a usable identifier; aborts immediately
    #[error("malformed term at line {line}: {reason}")]
    MalformedTerm { line: usize, reason: String },

    /// Relations whose targets are absent after the full first pass;
    /// batched so the caller sees every violation at once
    #[error("{} dangling reference(s): {}", .0.len(), format_dangling(.0))]
    DanglingReferences(Vec<DanglingReference>),

    /// An is_a cycle inside one namespace
    #[error("is_a cycle in {namespace}: {}", .cycle.join(" -> "))]
    CycleDetected {
        namespace: Namespace,
        cycle: Vec<String>,
    },
}

// ============================================================================
// Ontology Graph
// ============================================================================

/// The validated term and relation stores for one ontology snapshot
///
/// Terms are keyed by identifier; relations are kept both as a flat list
/// (for persistence) and as adjacency indexes (for traversal). The graph is
/// immutable once built.
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    version: Option<String>,
    terms: HashMap<String, Term>,
    relations: Vec<Relation>,
    outgoing: HashMap<String, Vec<(String, RelationKind)>>,
    incoming: HashMap<String, Vec<(String, RelationKind)>>,
    alt_ids: HashMap<String, String>,
    warnings: Vec<ParseWarning>,
}

impl OntologyGraph {
    /// Reassemble a graph from already-validated terms and relations,
    /// typically rows loaded from storage
    pub fn from_parts(
        version: Option<String>,
        terms: Vec<Term>,
        relations: Vec<Relation>,
    ) -> Self {
        let mut graph = OntologyGraph {
            version,
            ..Default::default()
        };
        for term in terms {
            for alt_id in &term.alt_ids {
                graph.alt_ids.insert(alt_id.clone(), term.id.clone());
            }
            graph.terms.insert(term.id.clone(), term);
        }
        for relation in relations {
            graph.push_relation(relation);
        }
        graph
    }

    /// Release identifier captured from the document header, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Warnings recorded while parsing and building
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Look up a term by identifier, following secondary ids
    pub fn get_term(&self, id: &str) -> Option<&Term> {
        let primary = self.resolve_id(id)?;
        self.terms.get(primary)
    }

    /// Resolve an identifier to the primary id it names, if known
    pub fn resolve_id<'a>(&'a self, id: &'a str) -> Option<&'a str> {
        if self.terms.contains_key(id) {
            return Some(id);
        }
        self.alt_ids.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resolve_id(id).is_some()
    }

    /// Iterate all terms (arbitrary order)
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    /// All relations in document order
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Outgoing edges from a term as (neighbor, kind) pairs
    ///
    /// The returned iterator is finite and can be re-created at will.
    pub fn outgoing<'a>(&'a self, id: &str) -> impl Iterator<Item = (&'a str, RelationKind)> + 'a {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|(target, kind)| (target.as_str(), *kind))
    }

    /// Incoming edges into a term as (neighbor, kind) pairs
    pub fn incoming<'a>(&'a self, id: &str) -> impl Iterator<Item = (&'a str, RelationKind)> + 'a {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(|(source, kind)| (source.as_str(), *kind))
    }

    /// Terms reachable by following outgoing edges of the given kinds,
    /// breadth-first, deduplicated, start excluded
    pub fn ancestors(&self, start: &str, kinds: &[RelationKind]) -> Vec<String> {
        self.traverse(start, kinds, TraversalDirection::Outgoing)
    }

    /// Terms reachable by following incoming edges of the given kinds,
    /// breadth-first, deduplicated, start excluded
    pub fn descendants(&self, start: &str, kinds: &[RelationKind]) -> Vec<String> {
        self.traverse(start, kinds, TraversalDirection::Incoming)
    }

    fn traverse(
        &self,
        start: &str,
        kinds: &[RelationKind],
        direction: TraversalDirection,
    ) -> Vec<String> {
        let Some(start) = self.resolve_id(start) else {
            return Vec::new();
        };

        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut frontier: Vec<&str> = vec![start];
        let mut result = Vec::new();

        while !frontier.is_empty() {
            // Within a level, newly discovered ids are emitted in sorted
            // order so traversal output is deterministic.
            let mut next: BTreeSet<&str> = BTreeSet::new();

            for node in frontier.drain(..) {
                let neighbors: Box<dyn Iterator<Item = (&str, RelationKind)>> = match direction {
                    TraversalDirection::Outgoing => Box::new(self.outgoing(node)),
                    TraversalDirection::Incoming => Box::new(self.incoming(node)),
                };
                for (neighbor, kind) in neighbors {
                    if !kinds.contains(&kind) || visited.contains(neighbor) {
                        continue;
                    }
                    if self.terms.get(neighbor).map(|t| t.is_obsolete).unwrap_or(true) {
                        continue;
                    }
                    visited.insert(neighbor);
                    next.insert(neighbor);
                }
            }

            result.extend(next.iter().map(|id| id.to_string()));
            frontier.extend(next);
        }

        result
    }

    /// Canonical SHA-256 digest of the graph content
    ///
    /// Line-per-entity serialization, sorted, so digest equality means
    /// content equality regardless of document ordering. The version label
    /// is deliberately not part of the digest.
    pub fn content_digest(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.terms.len() + self.relations.len());

        for term in self.terms.values() {
            let mut synonyms: Vec<String> = term
                .synonyms
                .iter()
                .map(|s| format!("{}:{}", s.scope, s.text))
                .collect();
            synonyms.sort();
            let mut alt_ids = term.alt_ids.clone();
            alt_ids.sort();

            lines.push(format!(
                "term\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                term.id,
                term.name,
                term.namespace,
                term.definition.as_deref().unwrap_or(""),
                term.is_obsolete,
                synonyms.join("|"),
                alt_ids.join("|"),
            ));
        }

        for relation in &self.relations {
            lines.push(format!(
                "rel\t{}\t{}\t{}",
                relation.source_id, relation.kind, relation.target_id
            ));
        }

        lines.sort();
        gobel_common::checksum::sha256_hex(lines.join("\n").as_bytes())
    }

    fn record_warning(&mut self, line: usize, message: impl Into<String>) {
        let warning = ParseWarning {
            line,
            message: message.into(),
        };
        warn!("build: {}", warning);
        self.warnings.push(warning);
    }

    fn push_relation(&mut self, relation: Relation) {
        self.outgoing
            .entry(relation.source_id.clone())
            .or_default()
            .push((relation.target_id.clone(), relation.kind));
        self.incoming
            .entry(relation.target_id.clone())
            .or_default()
            .push((relation.source_id.clone(), relation.kind));
        self.relations.push(relation);
    }
}

#[derive(Debug, Clone, Copy)]
enum TraversalDirection {
    Outgoing,
    Incoming,
}

// ============================================================================
// Graph Builder
// ============================================================================

/// Builds a validated `OntologyGraph` from a parsed document
///
/// Terms are registered in a first pass so relation declarations can refer
/// to terms that appear later in the document; relations are resolved in a
/// second pass; an is_a acyclicity check per namespace runs last.
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn build(document: OboDocument) -> Result<OntologyGraph> {
        let OboDocument {
            header,
            outcomes,
            warnings,
        } = document;

        let mut graph = OntologyGraph {
            version: header.release_version(),
            warnings,
            ..Default::default()
        };

        // Pass 1: register every term before any relation is resolved
        let mut pending: Vec<(String, bool, usize, Vec<RelationDecl>)> = Vec::new();
        for outcome in outcomes {
            match outcome {
                TermOutcome::Parsed(record) => {
                    if graph.terms.contains_key(&record.id) {
                        graph.record_warning(
                            record.line,
                            format!("duplicate term id {}, keeping the first", record.id),
                        );
                        continue;
                    }

                    for alt_id in &record.alt_ids {
                        if let Some(existing) = graph.alt_ids.get(alt_id) {
                            graph.record_warning(
                                record.line,
                                format!(
                                    "alt_id {} already claimed by {}, ignoring for {}",
                                    alt_id, existing, record.id
                                ),
                            );
                        } else {
                            graph.alt_ids.insert(alt_id.clone(), record.id.clone());
                        }
                    }

                    pending.push((
                        record.id.clone(),
                        record.is_obsolete,
                        record.line,
                        record.relations,
                    ));
                    graph.terms.insert(
                        record.id.clone(),
                        Term {
                            id: record.id,
                            name: record.name,
                            namespace: record.namespace,
                            definition: record.definition,
                            is_obsolete: record.is_obsolete,
                            synonyms: record.synonyms,
                            alt_ids: record.alt_ids,
                        },
                    );
                },
                TermOutcome::Skipped { line, reason } => {
                    graph.record_warning(line, format!("skipping stanza: {}", reason));
                },
                TermOutcome::Malformed { line, reason } => {
                    return Err(BuildError::MalformedTerm { line, reason });
                },
            }
        }

        // Pass 2: resolve relations now that every identifier is known
        let mut dangling: Vec<DanglingReference> = Vec::new();
        let mut seen_edges: HashSet<(String, String, RelationKind)> = HashSet::new();

        for (source_id, is_obsolete, line, decls) in pending {
            if is_obsolete {
                if !decls.is_empty() {
                    graph.record_warning(
                        line,
                        format!(
                            "{} is obsolete, dropping {} relation declaration(s)",
                            source_id,
                            decls.len()
                        ),
                    );
                }
                continue;
            }

            for decl in decls {
                if decl.target_id == source_id {
                    graph.record_warning(
                        line,
                        format!("self-loop {} -[{}]-> itself", source_id, decl.kind),
                    );
                    continue;
                }

                match graph.terms.get(&decl.target_id) {
                    None => {
                        dangling.push(DanglingReference {
                            source_id: source_id.clone(),
                            kind: decl.kind,
                            target_id: decl.target_id,
                        });
                    },
                    Some(target) if target.is_obsolete => {
                        graph.record_warning(
                            line,
                            format!(
                                "{} -[{}]-> {} targets an obsolete term, dropping",
                                source_id, decl.kind, decl.target_id
                            ),
                        );
                    },
                    Some(_) => {
                        let edge_key =
                            (source_id.clone(), decl.target_id.clone(), decl.kind);
                        if !seen_edges.insert(edge_key) {
                            debug!(
                                "duplicate relation {} -[{}]-> {}",
                                source_id, decl.kind, decl.target_id
                            );
                            continue;
                        }
                        graph.push_relation(Relation::new(
                            source_id.clone(),
                            decl.target_id,
                            decl.kind,
                        ));
                    },
                }
            }
        }

        if !dangling.is_empty() {
            return Err(BuildError::DanglingReferences(dangling));
        }

        // Pass 3: the is_a sub-DAG must stay acyclic inside each namespace
        Self::check_acyclic(&graph)?;

        Ok(graph)
    }

    /// Depth-first is_a cycle check, one namespace at a time
    fn check_acyclic(graph: &OntologyGraph) -> Result<()> {
        for namespace in Namespace::ALL {
            // is_a adjacency restricted to this namespace
            let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
            for relation in &graph.relations {
                if relation.kind != RelationKind::IsA {
                    continue;
                }
                let in_namespace = |id: &str| {
                    graph
                        .terms
                        .get(id)
                        .map(|t| t.namespace == namespace)
                        .unwrap_or(false)
                };
                if in_namespace(&relation.source_id) && in_namespace(&relation.target_id) {
                    adjacency
                        .entry(relation.source_id.as_str())
                        .or_default()
                        .push(relation.target_id.as_str());
                }
            }

            let mut roots: Vec<&str> = adjacency.keys().copied().collect();
            roots.sort_unstable();

            // 0 = unvisited, 1 = on the current path, 2 = done
            let mut state: HashMap<&str, u8> = HashMap::new();

            for root in roots {
                if state.get(root).copied().unwrap_or(0) != 0 {
                    continue;
                }

                // Iterative DFS; `path` mirrors the nodes on the stack
                let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
                let mut path: Vec<&str> = vec![root];
                state.insert(root, 1);

                while let Some((node, next_index)) = stack.pop() {
                    let neighbors = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);

                    match neighbors.get(next_index) {
                        Some(&neighbor) => {
                            stack.push((node, next_index + 1));
                            match state.get(neighbor).copied().unwrap_or(0) {
                                0 => {
                                    state.insert(neighbor, 1);
                                    stack.push((neighbor, 0));
                                    path.push(neighbor);
                                },
                                1 => {
                                    let start = path
                                        .iter()
                                        .position(|&id| id == neighbor)
                                        .unwrap_or(0);
                                    let mut cycle: Vec<String> =
                                        path[start..].iter().map(|id| id.to_string()).collect();
                                    cycle.push(neighbor.to_string());
                                    return Err(BuildError::CycleDetected { namespace, cycle });
                                },
                                _ => {},
                            }
                        },
                        None => {
                            state.insert(node, 2);
                            path.pop();
                        },
                    }
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
