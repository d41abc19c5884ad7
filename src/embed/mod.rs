pub mod ollama;

use thiserror::Error;

pub type Embedding = Vec<f32>;

/// Failures of the embedding model. Fatal to whatever call raised them;
/// callers decide whether terminology lookup is optional.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("embedding backend returned HTTP {0}")]
    Status(u16),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("embedding backend returned an empty vector")]
    EmptyEmbedding,

    #[error("embedding batch size mismatch: sent {expected} texts, got {actual} vectors")]
    BatchSize { expected: usize, actual: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Text to vector. Implementations must be deterministic for a fixed model,
/// otherwise repeated searches in one run stop agreeing with each other.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Embedding, EncodingError>;

    /// One vector per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncodingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn model_name(&self) -> &str;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_fully_similar() {
        let sim = cosine_similarity(&[0.3, 0.4], &[0.3, 0.4]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_zero_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_are_negative() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    struct Doubler;

    impl Embedder for Doubler {
        fn embed(&self, text: &str) -> Result<Embedding, EncodingError> {
            Ok(vec![text.len() as f32, 2.0 * text.len() as f32])
        }

        fn model_name(&self) -> &str {
            "doubler"
        }
    }

    #[test]
    fn default_batch_preserves_order() {
        let out = Doubler.embed_batch(&["a", "abc", ""]).unwrap();
        assert_eq!(out, vec![vec![1.0, 2.0], vec![3.0, 6.0], vec![0.0, 0.0]]);
    }
}
