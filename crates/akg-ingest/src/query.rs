//! SPARQL query construction

use akg_core::{AkgError, FetcherConfig, Result};

/// Namespace of DBpedia ontology classes and properties
pub const DBO_NAMESPACE: &str = "http://dbpedia.org/ontology/";

/// Query selecting every entity of a category together with its abstract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    category: String,
    text: String,
    default_graph: Option<String>,
    endpoint_timeout_ms: u64,
}

impl SparqlQuery {
    /// Build the abstracts query for `category`
    ///
    /// `category` must be a plain local name such as `Scientist`; anything
    /// else could change the meaning of the query and is rejected.
    pub fn for_category(category: &str, config: &FetcherConfig) -> Result<Self> {
        if !is_local_name(category) {
            return Err(AkgError::Config(format!(
                "invalid category name: {category:?}"
            )));
        }
        if !is_language_tag(&config.language) {
            return Err(AkgError::Config(format!(
                "invalid abstract language: {:?}",
                config.language
            )));
        }

        let mut text = format!(
            "PREFIX dbo: <{DBO_NAMESPACE}>\n\
             SELECT ?s ?abs WHERE {{ ?s a dbo:{category} . ?s dbo:abstract ?abs . \
             FILTER(lang(?abs) = \"{}\") }}",
            config.language
        );
        if let Some(limit) = config.limit {
            text.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(Self {
            category: category.to_string(),
            text,
            default_graph: config.default_graph.clone(),
            endpoint_timeout_ms: config.endpoint_timeout_ms,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Query text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn default_graph(&self) -> Option<&str> {
        self.default_graph.as_deref()
    }

    /// Server-side execution limit passed to the endpoint
    pub fn endpoint_timeout_ms(&self) -> u64 {
        self.endpoint_timeout_ms
    }
}

fn is_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}
