//! Vision-language inference layer for hdocr.
//!
//! This crate turns one invoice image into the raw text a vision-language
//! model produces for it. The core library only sees the
//! [`InferenceBackend`] trait; concrete transports live behind features:
//! - `http` (default): an OpenAI-compatible chat-completions endpoint
//!   (vLLM, Ollama, LM Studio) serving a model such as Vintern

mod backend;
mod chat;
mod error;

pub use backend::InferenceBackend;
pub use chat::DEFAULT_PROMPT;
pub use error::InferenceError;

#[cfg(feature = "http")]
pub use backend::http::HttpVisionBackend;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
