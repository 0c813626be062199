//! SPARQL JSON results parsing

use serde::Deserialize;

use akg_core::{normalize_iri, AkgError, Article, Result};

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    s: BoundValue,
    abs: BoundValue,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    value: String,
}

/// Parse a SPARQL 1.1 JSON results document into articles, in binding order
///
/// Every binding must carry `s` and `abs` with a string `value`; a missing
/// or mistyped field fails the whole response. Entity IRIs are normalized
/// with [`normalize_iri`]; a binding whose entity is not an IRI at all is
/// skipped.
pub fn parse_response(body: &str) -> Result<Vec<Article>> {
    let results: SparqlResults = serde_json::from_str(body)
        .map_err(|e| AkgError::Parse(format!("Malformed SPARQL response: {e}")))?;

    let mut articles = Vec::with_capacity(results.results.bindings.len());
    for binding in results.results.bindings {
        match normalize_iri(&binding.s.value) {
            Ok(entity_id) => articles.push(Article::new(entity_id, binding.abs.value)),
            Err(e) => tracing::warn!("Skipping binding: {e}"),
        }
    }
    Ok(articles)
}
