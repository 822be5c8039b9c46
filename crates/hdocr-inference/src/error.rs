//! Error types for the inference layer.

use thiserror::Error;

/// Errors that can occur while asking the model to read an image.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The image could not be opened or decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The backend could not be configured.
    #[error("invalid backend configuration: {0}")]
    Config(String),

    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("model endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the expected shape.
    #[error("malformed model response: {0}")]
    Response(String),

    /// The model answered with no text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// I/O error when reading the image file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
