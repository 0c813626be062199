//! AKG Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the AKG system:
//! - RDF terms and triples
//! - Ancestry relations and bounded ancestry sub-graphs
//! - Articles fetched from the remote knowledge base
//! - Common error types
//! - Shared traits for ancestry providers and triple extractors
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, FetcherConfig, LoggingConfig, OntologyConfig, PoolConfig,
};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for AKG operations
#[derive(Error, Debug)]
pub enum AkgError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AkgError {
    /// Wrap an I/O error together with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ConfigError> for AkgError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AkgError>;

// ============================================================================
// RDF Terms
// ============================================================================

/// Well-known vocabulary IRIs
pub mod vocab {
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
    pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
    pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
    pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form
    pub lexical: String,

    /// Datatype IRI (absent means plain `xsd:string`)
    pub datatype: Option<String>,

    /// Language tag (only for `rdf:langString`)
    pub language: Option<String>,
}

impl Literal {
    /// Create a plain string literal
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    /// Create a typed literal
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Create a language-tagged literal
    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// An RDF term: the position of a subject or object in a triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Term {
    /// Absolute IRI, stored without angle brackets
    Iri(String),
    /// Blank node label, stored without the `_:` prefix
    Blank(String),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// Create an IRI term
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// Create an IRI term from untrusted input, such as a remote binding
    ///
    /// See [`normalize_iri`].
    pub fn try_iri(iri: &str) -> Result<Self> {
        normalize_iri(iri).map(Self::Iri)
    }

    /// Create a blank node term
    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Create a plain literal term
    pub fn literal(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal::plain(lexical))
    }

    /// The opaque node identifier used for ancestry lookups.
    ///
    /// Literals are identified by their lexical form, which almost never
    /// names an ontology node, so they end up with empty ancestry.
    pub fn node_id(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::Blank(label) => label,
            Self::Literal(literal) => &literal.lexical,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

/// Percent-encode the characters RDF forbids inside an IRI reference and
/// check that the result is an absolute IRI
pub fn normalize_iri(iri: &str) -> Result<String> {
    oxrdf::NamedNode::new(encode_iri(iri))
        .map(oxrdf::NamedNode::into_string)
        .map_err(|e| AkgError::Parse(format!("invalid IRI {iri:?}: {e}")))
}

fn encode_iri(iri: &str) -> String {
    let mut encoded = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '\0'..=' ' | '\u{7f}' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                encoded.push_str(&format!("%{:02X}", c as u32));
            }
            c => encoded.push(c),
        }
    }
    encoded
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(label) => write!(f, "_:{label}"),
            Self::Literal(literal) => {
                write!(f, "{:?}", literal.lexical)?;
                if let Some(lang) = &literal.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &literal.datatype {
                    write!(f, "^^<{dt}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

// ============================================================================
// Triples
// ============================================================================

/// A subject-predicate-object statement.
///
/// Fields are private and there is no mutating API: a triple is never
/// changed after it has been created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    subject: Term,
    predicate: String,
    object: Term,
}

impl Triple {
    /// Create a new triple
    ///
    /// The subject must be an IRI or blank node.
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Result<Self> {
        if subject.is_literal() {
            return Err(AkgError::Parse(format!(
                "literal {subject} cannot be used as a subject"
            )));
        }
        let predicate = predicate.into();
        if predicate.is_empty() {
            return Err(AkgError::Parse("empty predicate IRI".to_string()));
        }
        Ok(Self {
            subject,
            predicate,
            object,
        })
    }

    /// Create an all-IRI triple from untrusted strings, see [`Term::try_iri`]
    pub fn try_from_iris(subject: &str, predicate: &str, object: &str) -> Result<Self> {
        Ok(Self {
            subject: Term::try_iri(subject)?,
            predicate: normalize_iri(predicate)?,
            object: Term::try_iri(object)?,
        })
    }

    /// Create a triple whose three positions are all IRIs
    ///
    /// The strings are taken as they are; use [`Triple::try_from_iris`] for
    /// input that may not be a valid IRI.
    pub fn from_iris(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: Term::iri(subject),
            predicate: predicate.into(),
            object: Term::iri(object),
        }
    }

    pub fn subject(&self) -> &Term {
        &self.subject
    }

    /// Predicate IRI
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn object(&self) -> &Term {
        &self.object
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)
    }
}

// ============================================================================
// Articles
// ============================================================================

/// An article abstract fetched from the remote knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Entity IRI the abstract describes
    pub entity_id: String,

    /// Abstract text
    pub text: String,
}

impl Article {
    pub fn new(entity_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            text: text.into(),
        }
    }
}

// ============================================================================
// Ancestry
// ============================================================================

/// Label of an ancestry relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AncestryLabel {
    /// Instance or subclass membership
    IsA,
    HasDomain,
    HasRange,
}

impl AncestryLabel {
    /// Every label; used for subject and object lineage
    pub const ALL: [AncestryLabel; 3] = [Self::IsA, Self::HasDomain, Self::HasRange];

    /// Labels followed from a predicate
    pub const DOMAIN_RANGE: [AncestryLabel; 2] = [Self::HasDomain, Self::HasRange];

    /// Map a predicate IRI to its ancestry label, if it is one
    pub fn from_predicate(iri: &str) -> Option<Self> {
        match iri {
            vocab::RDF_TYPE | vocab::RDFS_SUBCLASS_OF | vocab::RDFS_SUBPROPERTY_OF => {
                Some(Self::IsA)
            }
            vocab::RDFS_DOMAIN => Some(Self::HasDomain),
            vocab::RDFS_RANGE => Some(Self::HasRange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsA => "is-a",
            Self::HasDomain => "has-domain",
            Self::HasRange => "has-range",
        }
    }
}

impl std::fmt::Display for AncestryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One hop in an ontology hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AncestryRelation {
    pub from: String,
    pub label: AncestryLabel,
    pub to: String,

    /// Hop index of this edge counted from the seed (the seed's own edges are hop 1)
    pub hop: u32,
}

/// Relations reachable from a seed node within a bounded number of hops.
///
/// Built fresh for each lookup and owned by whoever asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestrySubgraph {
    seed: String,
    max_depth: u32,
    relations: Vec<AncestryRelation>,
}

impl AncestrySubgraph {
    /// Create a sub-graph from already bounded relations
    pub fn new(seed: impl Into<String>, max_depth: u32, relations: Vec<AncestryRelation>) -> Self {
        Self {
            seed: seed.into(),
            max_depth,
            relations,
        }
    }

    /// Sub-graph of a node that has no ancestry
    pub fn empty(seed: impl Into<String>, max_depth: u32) -> Self {
        Self::new(seed, max_depth, Vec::new())
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn relations(&self) -> &[AncestryRelation] {
        &self.relations
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Nodes reachable from the seed following only edges with the given labels.
    ///
    /// The seed itself is only included when a cycle leads back to it.
    pub fn reachable(&self, labels: &[AncestryLabel]) -> HashSet<String> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for relation in self.relations.iter().filter(|r| labels.contains(&r.label)) {
            adjacency
                .entry(relation.from.as_str())
                .or_default()
                .push(relation.to.as_str());
        }

        let mut reached = HashSet::new();
        let mut queue = VecDeque::from([self.seed.as_str()]);
        while let Some(node) = queue.pop_front() {
            for &next in adjacency.get(node).into_iter().flatten() {
                if reached.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }
        reached
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Source of bounded ancestry sub-graphs
///
/// Implementations must be pure: the result depends only on the seed, the
/// depth and the loaded ontology. Unknown seeds yield an empty sub-graph.
pub trait AncestryProvider: Send + Sync {
    fn build_ancestry(&self, seed: &str, max_depth: u32) -> AncestrySubgraph;
}

impl<T: AncestryProvider + ?Sized> AncestryProvider for std::sync::Arc<T> {
    fn build_ancestry(&self, seed: &str, max_depth: u32) -> AncestrySubgraph {
        (**self).build_ancestry(seed, max_depth)
    }
}

/// Extracts candidate triples from an article
pub trait TripleExtractor: Send + Sync {
    /// Extract zero or more candidate triples
    fn extract(&self, article: &Article) -> Result<Vec<Triple>>;

    /// Extractor name, recorded in worker logs
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(from: &str, label: AncestryLabel, to: &str, hop: u32) -> AncestryRelation {
        AncestryRelation {
            from: from.to_string(),
            label,
            to: to.to_string(),
            hop,
        }
    }

    #[test]
    fn test_literal_subject_rejected() {
        let result = Triple::new(Term::literal("x"), "ex:p", Term::iri("ex:o"));
        assert!(matches!(result, Err(AkgError::Parse(_))));
    }

    #[test]
    fn test_triple_accessors() {
        let triple = Triple::from_iris("ex:s", "ex:p", "ex:o");
        assert_eq!(triple.subject().node_id(), "ex:s");
        assert_eq!(triple.predicate(), "ex:p");
        assert_eq!(triple.object(), &Term::iri("ex:o"));
    }

    #[test]
    fn test_try_iri_encodes_forbidden_characters() {
        let term = Term::try_iri("http://dbpedia.org/resource/A|B C").unwrap();
        assert_eq!(term, Term::iri("http://dbpedia.org/resource/A%7CB%20C"));

        let unchanged = Term::try_iri("http://dbpedia.org/resource/Caf\u{e9}").unwrap();
        assert_eq!(unchanged.as_iri(), Some("http://dbpedia.org/resource/Caf\u{e9}"));
    }

    #[test]
    fn test_try_iri_requires_absolute_iri() {
        assert!(matches!(Term::try_iri("Ada Lovelace"), Err(AkgError::Parse(_))));
        assert!(matches!(Term::try_iri(""), Err(AkgError::Parse(_))));
    }

    #[test]
    fn test_try_from_iris_checks_every_position() {
        let triple = Triple::try_from_iris("ex:s", "ex:p", "ex:o{1}").unwrap();
        assert_eq!(triple.object(), &Term::iri("ex:o%7B1%7D"));
        assert!(Triple::try_from_iris("ex:s", "not an iri", "ex:o").is_err());
    }

    #[test]
    fn test_literal_node_id_is_lexical_form() {
        let term = Term::Literal(Literal::lang("Berlin", "en"));
        assert_eq!(term.node_id(), "Berlin");
        assert!(term.as_iri().is_none());
    }

    #[test]
    fn test_label_from_predicate() {
        assert_eq!(
            AncestryLabel::from_predicate(vocab::RDF_TYPE),
            Some(AncestryLabel::IsA)
        );
        assert_eq!(
            AncestryLabel::from_predicate(vocab::RDFS_SUBCLASS_OF),
            Some(AncestryLabel::IsA)
        );
        assert_eq!(
            AncestryLabel::from_predicate(vocab::RDFS_RANGE),
            Some(AncestryLabel::HasRange)
        );
        assert_eq!(AncestryLabel::from_predicate("ex:knows"), None);
    }

    #[test]
    fn test_reachable_follows_only_requested_labels() {
        let graph = AncestrySubgraph::new(
            "ex:worksAt",
            10,
            vec![
                relation("ex:worksAt", AncestryLabel::HasDomain, "ex:Agent", 1),
                relation("ex:worksAt", AncestryLabel::IsA, "ex:Property", 1),
                relation("ex:Agent", AncestryLabel::IsA, "ex:Thing", 2),
            ],
        );

        let domain_range = graph.reachable(&AncestryLabel::DOMAIN_RANGE);
        assert_eq!(domain_range, HashSet::from(["ex:Agent".to_string()]));

        let all = graph.reachable(&AncestryLabel::ALL);
        assert_eq!(all.len(), 3);
        assert!(all.contains("ex:Thing"));
    }

    #[test]
    fn test_reachable_on_empty_graph() {
        let graph = AncestrySubgraph::empty("ex:nothing", 10);
        assert!(graph.is_empty());
        assert!(graph.reachable(&AncestryLabel::ALL).is_empty());
    }

    #[test]
    fn test_term_serialization_shape() {
        let json = serde_json::to_value(Term::iri("ex:a")).unwrap();
        assert_eq!(json["kind"], "iri");
        assert_eq!(json["value"], "ex:a");
    }
}
