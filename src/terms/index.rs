use crate::embed::{Embedding, EncodingError, cosine_similarity};

use super::RetrievalError;

/// A stored embedding close to a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the term in the list the index was built from.
    pub index: usize,
    /// Cosine distance, `1 - cosine_similarity`, in `[0, 2]`.
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Exhaustive cosine-distance index over a fixed set of embeddings.
///
/// Built once; there is no insertion or removal, so reads never race a write.
#[derive(Debug)]
pub struct SimilarityIndex {
    embeddings: Vec<Embedding>,
    dimension: usize,
}

impl SimilarityIndex {
    pub fn build(embeddings: Vec<Embedding>) -> Result<Self, RetrievalError> {
        let Some(first) = embeddings.first() else {
            return Err(RetrievalError::Configuration(
                "cannot build a similarity index over zero embeddings".into(),
            ));
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(EncodingError::EmptyEmbedding.into());
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(EncodingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            }
            .into());
        }
        Ok(Self {
            embeddings,
            dimension,
        })
    }

    /// At most `k` neighbours, closest first. Equal distances keep the
    /// original term order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, EncodingError> {
        if query.len() != self.dimension {
            return Err(EncodingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, emb)| Neighbor {
                index,
                distance: (1.0 - cosine_similarity(query, emb)).clamp(0.0, 2.0),
            })
            .collect();

        // stable sort: ties stay in index order
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}
