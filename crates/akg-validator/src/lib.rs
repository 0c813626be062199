//! AKG Validator - Post-processing of extracted triples
//!
//! Decides whether a candidate triple is plausible by checking that its
//! subject (or, failing that, its object) shares a lineage node with the
//! predicate's declared domain/range in the background ontology:
//!
//! 1. `S` = ancestry of the subject (`is-a`, `has-domain`, `has-range`)
//! 2. `P` = domain/range ancestry of the predicate
//! 3. accept if `S ∩ P` is non-empty, without looking at the object
//! 4. `O` = ancestry of the object
//! 5. accept if `O ∩ P` is non-empty, otherwise reject
//!
//! This is a heuristic. Unknown nodes have empty ancestry and lineage beyond
//! the depth bound is invisible, so both only ever lead to a reject.

pub mod partition;

pub use partition::{BatchPartitioner, Partition, PartitionSummary};

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use akg_core::{AncestryLabel, AncestryProvider, Triple};
use serde::Serialize;

/// Default ancestry traversal depth
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Outcome of validating a triple, with the lineage nodes that justified it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Verdict {
    /// Subject and predicate share lineage nodes
    SubjectPredicate { shared: BTreeSet<String> },
    /// Object and predicate share lineage nodes
    ObjectPredicate { shared: BTreeSet<String> },
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Common-ancestor triple validator
#[derive(Clone)]
pub struct TripleValidator {
    provider: Arc<dyn AncestryProvider>,
    max_depth: u32,
}

impl TripleValidator {
    /// Create a validator with the default depth bound
    pub fn new(provider: Arc<dyn AncestryProvider>) -> Self {
        Self {
            provider,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the ancestry depth bound
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Accept or reject a triple
    pub fn validate(&self, triple: &Triple) -> bool {
        self.explain(triple).is_accepted()
    }

    /// Validate a triple and report which check accepted it
    pub fn explain(&self, triple: &Triple) -> Verdict {
        let subject = self.lineage(triple.subject().node_id(), &AncestryLabel::ALL);
        let predicate = self.lineage(triple.predicate(), &AncestryLabel::DOMAIN_RANGE);

        let shared = intersection(&subject, &predicate);
        if !shared.is_empty() {
            tracing::debug!("Accepted {triple} via subject lineage {shared:?}");
            return Verdict::SubjectPredicate { shared };
        }

        let object = self.lineage(triple.object().node_id(), &AncestryLabel::ALL);
        let shared = intersection(&object, &predicate);
        if !shared.is_empty() {
            tracing::debug!("Accepted {triple} via object lineage {shared:?}");
            return Verdict::ObjectPredicate { shared };
        }

        tracing::debug!("Rejected {triple}: no shared lineage");
        Verdict::Rejected
    }

    fn lineage(&self, node: &str, labels: &[AncestryLabel]) -> HashSet<String> {
        self.provider
            .build_ancestry(node, self.max_depth)
            .reachable(labels)
    }
}

fn intersection(a: &HashSet<String>, b: &HashSet<String>) -> BTreeSet<String> {
    a.intersection(b).cloned().collect()
}

// ============================================================================
// Tests
// ============================================================================
