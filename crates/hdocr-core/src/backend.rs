//! Building the configured inference backend.

use std::time::Duration;

use tracing::info;

use hdocr_inference::HttpVisionBackend;

use crate::error::{HdocrError, Result};
use crate::models::config::InferenceConfig;

/// Create the HTTP vision backend described by `config`.
pub fn create_backend(config: &InferenceConfig) -> Result<HttpVisionBackend> {
    validate(config)?;

    let backend = HttpVisionBackend::with_timeout(
        config.endpoint.clone(),
        config.model.clone(),
        Duration::from_secs(config.timeout_secs),
    )?
    .with_api_key(config.api_key.clone())
    .with_prompt(config.prompt.clone())
    .with_max_tokens(config.max_tokens)
    .with_repetition_penalty(config.repetition_penalty)
    .with_max_image_size(config.max_image_size);

    info!("Using model {} at {}", config.model, config.endpoint);
    Ok(backend)
}

fn validate(config: &InferenceConfig) -> Result<()> {
    let limits = [
        ("inference.timeout_secs", config.timeout_secs),
        ("inference.max_tokens", u64::from(config.max_tokens)),
        ("inference.max_image_size", u64::from(config.max_image_size)),
    ];
    for (key, value) in limits {
        if value == 0 {
            return Err(HdocrError::Config(format!("{} must be greater than 0", key)));
        }
    }
    Ok(())
}
