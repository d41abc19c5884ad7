use serde::Deserialize;
use tracing::debug;

use super::{Embedder, Embedding, EncodingError};

/// Longest input (in bytes) sent to the model.
const MAX_INPUT_BYTES: usize = 8192;

pub struct OllamaEmbedder {
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// No request is made here; an unreachable server surfaces on the first
    /// `embed` call.
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EncodingError> {
        let text = if text.is_empty() { " " } else { text };
        let text = truncate_at_char_boundary(text, MAX_INPUT_BYTES);

        let url = self.endpoint();
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let mut response = match ureq::post(&url).send_json(&body) {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => return Err(EncodingError::Status(code)),
            Err(e) => return Err(EncodingError::Unavailable(format!("{url}: {e}"))),
        };

        let resp: EmbeddingResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| EncodingError::MalformedResponse(e.to_string()))?;

        if resp.embedding.is_empty() {
            return Err(EncodingError::EmptyEmbedding);
        }
        debug!(model = %self.model, dims = resp.embedding.len(), "embedded text");
        Ok(resp.embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
