use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE: &str = "proofmark.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub embed: EmbedConfig,
    pub terminology: TerminologyConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub url: String,
    /// Generation model
    pub model: String,
    pub temperature: f32,
    /// Per-request timeout for generation calls
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Embedding model used for terminology lookup
    pub model: String,
    /// Server for embeddings (defaults to `ollama.url`)
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminologyConfig {
    /// JSON array of `{"term": ...}` records
    pub path: Option<PathBuf>,
    /// Minimum cosine similarity for a term to be offered to the model
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of revision passes
    pub repeat: usize,
    /// Ask the model why each paragraph changed and write the audit trail
    pub rationale: bool,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "gemma3".into(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm".into(),
            url: None,
        }
    }
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            path: None,
            threshold: 0.7,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repeat: 1,
            rationale: true,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `proofmark.toml` in `dir` when it
    /// exists, falling back to defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = dir.join(CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config from {}", path.display()))
    }

    pub fn embed_url(&self) -> &str {
        self.embed.url.as_deref().unwrap_or(&self.ollama.url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.timeout_secs)
    }

    /// Write the current config as TOML (for `proofmark init`).
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }
}
