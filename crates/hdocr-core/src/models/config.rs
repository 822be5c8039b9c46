//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use hdocr_inference::DEFAULT_PROMPT;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "HDOCR_API_KEY";

/// Main configuration for hdocr.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HdocrConfig {
    /// Vision-language model configuration.
    pub inference: InferenceConfig,

    /// Line-item extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch and staging configuration.
    pub batch: BatchConfig,
}

/// Vision-language model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// OpenAI-compatible chat-completions URL.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Bearer token, if the endpoint requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Question asked for every image.
    pub prompt: String,

    /// Maximum number of generated tokens.
    pub max_tokens: u32,

    /// Repetition penalty passed through to the server.
    pub repetition_penalty: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Longer image side sent to the model, in pixels.
    pub max_image_size: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1/chat/completions".to_string(),
            model: "5CD-AI/Vintern-1B-v3_5".to_string(),
            api_key: None,
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: 2048,
            repetition_penalty: Some(2.5),
            timeout_secs: 300,
            max_image_size: 1792,
        }
    }
}

/// Line-item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many of the four columns a header line must name (name included).
    pub min_header_fields: usize,

    /// Look for a JSON array/object when no table rows were found.
    pub json_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_header_fields: 3,
            json_fallback: true,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// File extensions picked up from a folder (lowercase, no dot).
    pub allowed_extensions: Vec<String>,

    /// Where uploaded bytes are staged (system temp dir when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: crate::batch::DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            staging_dir: None,
        }
    }
}

impl HdocrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Fill the API key from [`API_KEY_ENV`] when the file left it unset.
    pub fn with_env_overrides(mut self) -> Self {
        if self.inference.api_key.is_none() {
            self.inference.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }
}
