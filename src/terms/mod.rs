//! Terminology retrieval: a small in-memory nearest-neighbour search over
//! embedded vocabulary entries, used to put relevant terms into revision
//! prompts.
//!
//! Build once with [`TermRetriever::build`] and call
//! [`TermRetriever::search`] per paragraph. [`find_similar_terms`] is the
//! single-shot variant that re-embeds the whole list on every call.

pub mod index;
pub mod retriever;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

use crate::embed::{Embedder, EncodingError};

pub use retriever::{TermMatch, TermRetriever};

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Malformed or empty terminology input. Raised before any encoding work.
    #[error("terminology configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A vocabulary entry. Only `text` takes part in matching; every other field
/// of the source record is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    #[serde(rename = "term")]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Term {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validate one raw record. `position` only feeds the error message.
    pub fn from_record(record: Value, position: usize) -> Result<Self, RetrievalError> {
        let Value::Object(mut fields) = record else {
            return Err(RetrievalError::Configuration(format!(
                "terminology record {position} is not an object"
            )));
        };
        let text = match fields.remove("term") {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::String(_)) => {
                return Err(RetrievalError::Configuration(format!(
                    "terminology record {position} has a blank \"term\""
                )));
            }
            Some(_) => {
                return Err(RetrievalError::Configuration(format!(
                    "terminology record {position}: \"term\" must be a string"
                )));
            }
            None => {
                return Err(RetrievalError::Configuration(format!(
                    "terminology record {position} is missing \"term\""
                )));
            }
        };
        Ok(Self { text, extra: fields })
    }
}

/// The loaded term list. Never empty; never changes after construction.
#[derive(Debug, Clone)]
pub struct TermStore {
    terms: Vec<Term>,
}

impl TermStore {
    pub fn new(terms: Vec<Term>) -> Result<Self, RetrievalError> {
        if terms.is_empty() {
            return Err(RetrievalError::Configuration(
                "terminology list is empty".into(),
            ));
        }
        Ok(Self { terms })
    }

    pub fn from_records(records: Vec<Value>) -> Result<Self, RetrievalError> {
        let terms = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Term::from_record(r, i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(terms)
    }

    /// Read a JSON array of term records from disk.
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Configuration(format!("reading {}: {e}", path.display()))
        })?;
        let records: Vec<Value> = serde_json::from_str(&contents).map_err(|e| {
            RetrievalError::Configuration(format!("parsing {}: {e}", path.display()))
        })?;
        Self::from_records(records)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn get(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    pub fn surface_forms(&self) -> Vec<&str> {
        self.terms.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One-off lookup: embeds the whole term list, answers a single query and
/// throws the index away. Use [`TermRetriever`] when querying more than once.
pub fn find_similar_terms(
    text: &str,
    terms: Vec<Term>,
    embedder: &dyn Embedder,
    threshold: f32,
) -> Result<Vec<String>, RetrievalError> {
    let store = TermStore::new(terms)?;
    TermRetriever::build(store, embedder)?.search(text, threshold)
}
