//! HTTP backend for OpenAI-compatible vision-language endpoints.

use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::{GenericImageView, ImageFormat};
use reqwest::blocking::Client;
use tracing::debug;

use crate::chat::{ChatRequest, DEFAULT_PROMPT, parse_chat_response};
use crate::error::InferenceError;
use crate::{InferenceBackend, Result};

/// Backend posting each image to a chat-completions endpoint.
pub struct HttpVisionBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    prompt: String,
    max_tokens: u32,
    repetition_penalty: Option<f32>,
    max_image_size: u32,
}

impl HttpVisionBackend {
    /// Create a backend for `endpoint` serving `model` with default settings.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, model, Duration::from_secs(300))
    }

    /// Create a backend whose requests give up after `timeout`.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(InferenceError::Config(format!(
                "endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key: None,
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: 2048,
            repetition_penalty: None,
            max_image_size: 1792,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Replace the extraction question.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the generation budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the repetition penalty (omitted from the request when `None`).
    pub fn with_repetition_penalty(mut self, penalty: Option<f32>) -> Self {
        self.repetition_penalty = penalty;
        self
    }

    /// Bound the longer image side sent to the model.
    pub fn with_max_image_size(mut self, size: u32) -> Self {
        self.max_image_size = size.max(1);
        self
    }

    fn post(&self, request: &ChatRequest<'_>) -> Result<String> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::Http {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        Ok(body)
    }
}

impl InferenceBackend for HttpVisionBackend {
    fn infer(&self, image: &Path) -> Result<String> {
        let start = Instant::now();
        let data_url = encode_image(image, self.max_image_size)?;

        let mut request = ChatRequest::single_image(&self.model, &self.prompt, data_url);
        request.max_tokens = self.max_tokens;
        request.repetition_penalty = self.repetition_penalty;

        let body = self.post(&request)?;
        let text = parse_chat_response(&body)?;

        debug!(
            "{} answered {} chars for {} in {:?}",
            self.model,
            text.len(),
            image.display(),
            start.elapsed()
        );

        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Decode the image, shrink it to fit `max_size`, and wrap it as a PNG data URL.
pub(crate) fn encode_image(path: &Path, max_size: u32) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| InferenceError::InvalidImage(format!("{}: {}", path.display(), e)))?;

    let (width, height) = image.dimensions();
    let image = if width.max(height) > max_size {
        debug!("Resizing {}x{} image to fit {}", width, height, max_size);
        image.resize(max_size, max_size, image::imageops::FilterType::Lanczos3)
    } else {
        image
    };

    let mut png = Cursor::new(Vec::new());
    image
        .to_rgb8()
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| InferenceError::InvalidImage(e.to_string()))?;

    Ok(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(png.into_inner())
    ))
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_encode_image_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "small.png", 8, 4);

        let url = encode_image(&path, 1792).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let payload = url.trim_start_matches("data:image/png;base64,");
        let decoded = image::load_from_memory(&BASE64_STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }

    #[test]
    fn test_encode_image_downsizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 400, 100);

        let url = encode_image(&path, 200).unwrap();
        let payload = url.trim_start_matches("data:image/png;base64,");
        let decoded = image::load_from_memory(&BASE64_STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (200, 50));
    }

    #[test]
    fn test_encode_garbage_is_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(matches!(
            encode_image(&path, 1792),
            Err(InferenceError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            encode_image(&dir.path().join("nope.png"), 1792),
            Err(InferenceError::Io(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(matches!(
            HttpVisionBackend::new("localhost:8000", "vintern"),
            Err(InferenceError::Config(_))
        ));
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let backend = HttpVisionBackend::new("http://localhost:8000/v1/chat/completions", "vintern")
            .unwrap()
            .with_api_key(Some("  ".to_string()));
        assert!(backend.api_key.is_none());
        assert_eq!(backend.name(), "vintern");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hóa đơn", 3), "hóa...");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
