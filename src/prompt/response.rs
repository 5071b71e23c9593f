//! Typed decoding of raw LLM responses.
//!
//! Models wrap JSON in markdown fences, return a bare array where an object
//! was asked for, or emit triples as either arrays or objects. Everything is
//! decoded into explicit records here so nothing untyped reaches the graph.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::canonicalize::alias::AliasGroup;
use crate::error::{ClassificationError, ExtractionError};
use crate::graph::Triple;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("code fence pattern is valid")
});

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    match CODE_FENCE.captures(response).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => response.trim(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTriple {
    Tuple(String, String, String),
    Object {
        #[serde(alias = "source", alias = "head")]
        subject: String,
        #[serde(alias = "predicate", alias = "label")]
        relation: String,
        #[serde(alias = "target", alias = "tail")]
        object: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExtraction {
    Wrapped { relations: Vec<RawTriple> },
    Bare(Vec<RawTriple>),
}

/// Decode an extraction response into triples.
///
/// Accepts `{"relations": [...]}` or a bare array, where each relation is
/// `[s, r, o]` or `{"subject", "relation", "object"}`. Blank triples are
/// dropped; anything else that does not fit is a malformed response.
pub fn parse_triples(response: &str) -> Result<Vec<Triple>, ExtractionError> {
    let body = strip_code_fence(response);
    let raw: RawExtraction = serde_json::from_str(body)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    let raw = match raw {
        RawExtraction::Wrapped { relations } => relations,
        RawExtraction::Bare(relations) => relations,
    };

    let total = raw.len();
    let triples: Vec<Triple> = raw
        .into_iter()
        .filter_map(|t| match t {
            RawTriple::Tuple(s, r, o) => Triple::from_parts(&s, &r, &o),
            RawTriple::Object {
                subject,
                relation,
                object,
            } => Triple::from_parts(&subject, &relation, &object),
        })
        .collect();

    if triples.len() < total {
        tracing::warn!(
            "Dropped {} blank relation(s) from extraction response",
            total - triples.len()
        );
    }

    Ok(triples)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawClassification {
    Wrapped { groups: Vec<AliasGroup> },
    Bare(Vec<AliasGroup>),
}

/// Decode a classification response into alias groups
pub fn parse_alias_groups(response: &str) -> Result<Vec<AliasGroup>, ClassificationError> {
    let body = strip_code_fence(response);
    let raw: RawClassification = serde_json::from_str(body)
        .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

    Ok(match raw {
        RawClassification::Wrapped { groups } => groups,
        RawClassification::Bare(groups) => groups,
    })
}
