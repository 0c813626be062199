//! AKG Ontology - Background ontology graph
//!
//! Loads an ontology from N-Triples or Turtle into a directed graph whose edges are
//! the ancestry relations (`is-a`, `has-domain`, `has-range`) and answers
//! depth-bounded ancestry lookups for the triple validator.
//!
//! The ontology is loaded once and is read-only afterwards, so a single
//! instance can be shared across threads behind an `Arc`.

pub mod cache;

pub use cache::{AncestryCacheStats, CachedAncestry};

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use akg_core::{
    AncestryLabel, AncestryProvider, AncestryRelation, AncestrySubgraph, Result, Term, Triple,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Directed graph of ancestry relations
#[derive(Debug, Default)]
pub struct Ontology {
    graph: DiGraph<String, AncestryLabel>,
    index: HashMap<String, NodeIndex>,
    /// Statements in the source file that are not ancestry relations
    skipped: usize,
}

impl Ontology {
    /// Create an empty ontology
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an ontology from an N-Triples or Turtle file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let triples = akg_parser::read_triples(path)?;
        let ontology = Self::from_triples(&triples);

        tracing::info!(
            "Loaded ontology from {}: {} nodes, {} ancestry relations ({} other statements skipped)",
            path.display(),
            ontology.node_count(),
            ontology.relation_count(),
            ontology.skipped
        );
        Ok(ontology)
    }

    /// Build an ontology from parsed triples
    ///
    /// Only `rdf:type`, `rdfs:subClassOf`, `rdfs:subPropertyOf`, `rdfs:domain`
    /// and `rdfs:range` statements between resources become edges.
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut ontology = Self::new();
        for triple in triples {
            let label = AncestryLabel::from_predicate(triple.predicate());
            match (label, triple.object()) {
                (Some(label), Term::Iri(_) | Term::Blank(_)) => {
                    ontology.add_relation(
                        triple.subject().node_id(),
                        label,
                        triple.object().node_id(),
                    );
                }
                _ => ontology.skipped += 1,
            }
        }
        ontology
    }

    /// Add one ancestry relation; duplicates are ignored
    pub fn add_relation(&mut self, from: &str, label: AncestryLabel, to: &str) {
        let a = self.node(from);
        let b = self.node(to);
        let exists = self
            .graph
            .edges_connecting(a, b)
            .any(|edge| *edge.weight() == label);
        if !exists {
            self.graph.add_edge(a, b, label);
        }
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.index.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), index);
        index
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relation_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Statements that were read but are not ancestry relations
    pub fn skipped_statements(&self) -> usize {
        self.skipped
    }
}

impl AncestryProvider for Ontology {
    /// Breadth-first walk from `seed`; edges leaving a node at depth
    /// `max_depth` are not followed, so no relation ends further than
    /// `max_depth` hops from the seed.
    fn build_ancestry(&self, seed: &str, max_depth: u32) -> AncestrySubgraph {
        let Some(&start) = self.index.get(seed) else {
            return AncestrySubgraph::empty(seed, max_depth);
        };

        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0u32)]);
        let mut relations = Vec::new();

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in self.graph.edges(node) {
                let target = edge.target();
                relations.push(AncestryRelation {
                    from: self.graph[node].clone(),
                    label: *edge.weight(),
                    to: self.graph[target].clone(),
                    hop: depth + 1,
                });
                if visited.insert(target) {
                    queue.push_back((target, depth + 1));
                }
            }
        }

        AncestrySubgraph::new(seed, max_depth, relations)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use akg_core::{vocab, Literal};

    fn chain(length: usize) -> Ontology {
        let mut ontology = Ontology::new();
        for i in 0..length {
            let (from, to) = (format!("ex:n{i}"), format!("ex:n{}", i + 1));
            ontology.add_relation(&from, AncestryLabel::IsA, &to);
        }
        ontology
    }

    #[test]
    fn test_unknown_seed_yields_empty_graph() {
        let ontology = chain(3);
        let graph = ontology.build_ancestry("ex:missing", 10);
        assert!(graph.is_empty());
        assert_eq!(graph.seed(), "ex:missing");
    }

    #[test]
    fn test_depth_bound_on_long_chain() {
        let ontology = chain(15);
        let graph = ontology.build_ancestry("ex:n0", 10);

        assert_eq!(graph.len(), 10);
        assert!(graph.relations().iter().all(|r| r.hop <= 10));

        let reached = graph.reachable(&AncestryLabel::ALL);
        for i in 1..=10 {
            assert!(reached.contains(&format!("ex:n{i}")), "hop {i} should be visible");
        }
        for i in 11..=15 {
            assert!(!reached.contains(&format!("ex:n{i}")), "hop {i} must be cut off");
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let mut ontology = Ontology::new();
        ontology.add_relation("ex:a", AncestryLabel::IsA, "ex:b");
        ontology.add_relation("ex:b", AncestryLabel::IsA, "ex:a");

        let graph = ontology.build_ancestry("ex:a", 10);
        assert_eq!(graph.len(), 2);
        assert!(graph.reachable(&AncestryLabel::ALL).contains("ex:a"));
    }

    #[test]
    fn test_from_triples_keeps_only_ancestry_edges() {
        let triples = vec![
            Triple::from_iris("ex:Person", vocab::RDFS_SUBCLASS_OF, "ex:Agent"),
            Triple::from_iris("ex:worksAt", vocab::RDFS_DOMAIN, "ex:Agent"),
            Triple::from_iris("ex:worksAt", vocab::RDFS_DOMAIN, "ex:Agent"),
            Triple::from_iris("ex:alice", "ex:knows", "ex:bob"),
            Triple::new(
                Term::iri("ex:Person"),
                vocab::RDFS_RANGE,
                Term::Literal(Literal::plain("not a node")),
            )
            .unwrap(),
        ];

        let ontology = Ontology::from_triples(&triples);
        assert_eq!(ontology.relation_count(), 2);
        assert_eq!(ontology.skipped_statements(), 2);
        assert!(ontology.contains("ex:Agent"));
        assert!(!ontology.contains("ex:bob"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.nt");
        std::fs::write(
            &path,
            format!(
                "<http://ex.org/Person> <{}> <http://ex.org/Agent> .\n",
                vocab::RDFS_SUBCLASS_OF
            ),
        )
        .unwrap();

        let ontology = Ontology::load(&path).unwrap();
        let graph = ontology.build_ancestry("http://ex.org/Person", 10);
        assert_eq!(graph.relations()[0].to, "http://ex.org/Agent");
        assert_eq!(graph.relations()[0].label, AncestryLabel::IsA);
    }

    #[test]
    fn test_load_turtle_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ttl");
        std::fs::write(
            &path,
            "@prefix ex: <http://ex.org/> .\n\
             ex:Person rdfs:subClassOf ex:Agent .\n\
             ex:worksAt rdfs:domain ex:Agent ;\n    rdfs:range ex:Organization .\n\
             ex:aliceX a ex:Person .\n",
        )
        .unwrap();

        let ontology = Ontology::load(&path).unwrap();
        assert_eq!(ontology.relation_count(), 4);

        let graph = ontology.build_ancestry("http://ex.org/aliceX", 10);
        let reached = graph.reachable(&AncestryLabel::ALL);
        assert!(reached.contains("http://ex.org/Agent"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Ontology::load("/nonexistent/graph.nt").is_err());
    }
}
