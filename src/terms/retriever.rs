use tracing::{debug, info};

use crate::embed::{Embedder, EncodingError};

use super::index::SimilarityIndex;
use super::{RetrievalError, Term, TermStore};

/// A term that cleared the threshold, with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct TermMatch<'t> {
    pub term: &'t Term,
    pub similarity: f32,
}

/// Reusable handle over an embedded term list.
///
/// Owns the store and its index; borrows the embedder, which is shared with
/// whatever else needs encoding. Searches take `&self` and never mutate, so
/// one retriever can serve any number of paragraphs.
pub struct TermRetriever<'e> {
    store: TermStore,
    index: SimilarityIndex,
    embedder: &'e dyn Embedder,
}

impl<'e> TermRetriever<'e> {
    /// Embed every surface form in one batch and index the result.
    pub fn build(store: TermStore, embedder: &'e dyn Embedder) -> Result<Self, RetrievalError> {
        let forms = store.surface_forms();
        let embeddings = embedder.embed_batch(&forms)?;
        if embeddings.len() != forms.len() {
            return Err(EncodingError::BatchSize {
                expected: forms.len(),
                actual: embeddings.len(),
            }
            .into());
        }
        let index = SimilarityIndex::build(embeddings)?;
        info!(
            terms = store.len(),
            dims = index.dimension(),
            model = embedder.model_name(),
            "terminology index ready"
        );
        Ok(Self {
            store,
            index,
            embedder,
        })
    }

    /// Surface forms whose similarity to `text` is at least `threshold`,
    /// closest first.
    ///
    /// Any float is accepted: `threshold <= 0` returns every term, even
    /// anti-correlated ones, and `threshold > 1` returns nothing. No match is
    /// an empty vector, not an error.
    pub fn search(&self, text: &str, threshold: f32) -> Result<Vec<String>, RetrievalError> {
        Ok(self
            .search_scored(text, threshold)?
            .into_iter()
            .map(|m| m.term.text.clone())
            .collect())
    }

    pub fn search_scored(
        &self,
        text: &str,
        threshold: f32,
    ) -> Result<Vec<TermMatch<'_>>, RetrievalError> {
        let query = self.embedder.embed(text)?;
        let neighbors = self.index.nearest(&query, self.index.len())?;

        let matches: Vec<TermMatch<'_>> = neighbors
            .into_iter()
            .filter(|n| threshold <= 0.0 || n.similarity() >= threshold)
            .filter_map(|n| {
                self.store.get(n.index).map(|term| TermMatch {
                    term,
                    similarity: n.similarity(),
                })
            })
            .collect();

        debug!(
            threshold,
            hits = matches.len(),
            matches = ?matches
                .iter()
                .map(|m| (m.term.text.as_str(), m.similarity))
                .collect::<Vec<_>>(),
            "terminology lookup"
        );
        Ok(matches)
    }

    pub fn store(&self) -> &TermStore {
        &self.store
    }
}
