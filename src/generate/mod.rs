pub mod ollama;

use thiserror::Error;

/// Why no revision was produced. Transport details are flattened to strings
/// so callers never handle HTTP client types.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("generation service returned HTTP {0}")]
    Status(u16),

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Prompt in, completion out.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
    fn model_name(&self) -> &str;
}
