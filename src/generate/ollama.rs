use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{GenerateError, Generator};

pub struct OllamaGenerator {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, temperature: f32, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        })
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = self.endpoint();
        let body = self.request_body(prompt);

        let mut response = match self.agent.post(&url).send_json(&body) {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => return Err(GenerateError::Status(code)),
            Err(e) => return Err(GenerateError::Transport(format!("{url}: {e}"))),
        };

        let resp: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

        let text = completion(resp)?;
        debug!(model = %self.model, chars = text.chars().count(), "generation complete");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn completion(resp: GenerateResponse) -> Result<String, GenerateError> {
    resp.response
        .ok_or_else(|| GenerateError::MalformedResponse("missing \"response\" field".into()))
}
