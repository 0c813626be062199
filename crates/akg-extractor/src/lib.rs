//! AKG Extractor - Rule-based triple extraction
//!
//! Turns article abstracts into candidate triples. Each rule is a regex with
//! one capture group for the object phrase; the subject is always the entity
//! the article describes. Object phrases are mapped to resource IRIs by
//! joining their words with `_` under a resource namespace, e.g.
//! `New York City` -> `http://dbpedia.org/resource/New_York_City`.
//!
//! Candidates are deliberately noisy; the validator filters them later.

use std::collections::HashSet;

use akg_core::{AkgError, Article, Result, Term, Triple, TripleExtractor};
use regex::Regex;

/// Default namespace for extracted object resources
pub const DBPEDIA_RESOURCE: &str = "http://dbpedia.org/resource/";

/// Default namespace for extracted predicates
pub const DBPEDIA_ONTOLOGY: &str = "http://dbpedia.org/ontology/";

/// One or more capitalized words, e.g. `Vienna` or `Bell Telephone Company`
const PROPER_NOUN: &str = r"(\p{Lu}[\w'-]*(?:\s+\p{Lu}[\w'-]*)*)";

// ============================================================================
// Patterns
// ============================================================================

/// A regex whose first capture group is the object of `predicate`
#[derive(Debug, Clone)]
pub struct RelationPattern {
    regex: Regex,
    predicate: String,
}

impl RelationPattern {
    /// Compile a pattern; `pattern` must contain a capture group
    pub fn new(pattern: &str, predicate: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| AkgError::Config(format!("invalid extraction pattern {pattern:?}: {e}")))?;
        if regex.captures_len() < 2 {
            return Err(AkgError::Config(format!(
                "extraction pattern {pattern:?} has no capture group"
            )));
        }
        Ok(Self {
            regex,
            predicate: predicate.into(),
        })
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Regex-driven extractor over English abstracts
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<RelationPattern>,
    resource_base: String,
}

impl PatternExtractor {
    /// Create an extractor with the built-in DBpedia rules
    pub fn new() -> Self {
        let mut extractor = Self::empty(DBPEDIA_RESOURCE);
        extractor.init_dbpedia_patterns();
        extractor
    }

    /// Create an extractor without rules
    pub fn empty(resource_base: impl Into<String>) -> Self {
        Self {
            patterns: Vec::new(),
            resource_base: resource_base.into(),
        }
    }

    fn init_dbpedia_patterns(&mut self) {
        let rules = [
            (r"\bborn in ", "birthPlace"),
            (r"\bdied in ", "deathPlace"),
            (r"\b(?:is|was) located in (?:the )?", "location"),
            (r"\bheadquartered in (?:the )?", "headquarter"),
            (r"\bfounded by ", "foundedBy"),
            (r"\b(?:is|was) a member of the ", "party"),
            (r"\bcapital (?:city )?of (?:the )?", "country"),
        ];
        for (prefix, property) in rules {
            let pattern = format!("{prefix}{PROPER_NOUN}");
            match RelationPattern::new(&pattern, format!("{DBPEDIA_ONTOLOGY}{property}")) {
                Ok(rule) => self.patterns.push(rule),
                Err(e) => tracing::warn!("Skipping built-in rule: {e}"),
            }
        }
    }

    /// Add a custom rule
    pub fn with_pattern(mut self, pattern: &str, predicate: impl Into<String>) -> Result<Self> {
        self.patterns.push(RelationPattern::new(pattern, predicate)?);
        Ok(self)
    }

    pub fn patterns(&self) -> &[RelationPattern] {
        &self.patterns
    }

    /// Map an object phrase to a resource IRI
    fn resource_iri(&self, phrase: &str) -> String {
        let local: Vec<&str> = phrase.split_whitespace().collect();
        format!("{}{}", self.resource_base, local.join("_"))
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleExtractor for PatternExtractor {
    fn extract(&self, article: &Article) -> Result<Vec<Triple>> {
        if article.entity_id.trim().is_empty() {
            return Err(AkgError::Extraction(
                "article has no entity identifier".to_string(),
            ));
        }

        let subject = Term::try_iri(&article.entity_id)
            .map_err(|e| AkgError::Extraction(format!("article subject: {e}")))?;

        let mut seen = HashSet::new();
        let mut triples = Vec::new();
        for pattern in &self.patterns {
            for captures in pattern.regex.captures_iter(&article.text) {
                let Some(phrase) = captures.get(1) else {
                    continue;
                };
                let object = match Term::try_iri(&self.resource_iri(phrase.as_str())) {
                    Ok(object) => object,
                    Err(e) => {
                        tracing::debug!("Skipping phrase {:?}: {e}", phrase.as_str());
                        continue;
                    }
                };
                let triple = Triple::new(subject.clone(), pattern.predicate.as_str(), object)?;
                if seen.insert(triple.clone()) {
                    triples.push(triple);
                }
            }
        }

        tracing::debug!(
            "Extracted {} candidate triples for {}",
            triples.len(),
            article.entity_id
        );
        Ok(triples)
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

// ============================================================================
// Tests
// ============================================================================
