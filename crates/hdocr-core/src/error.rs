//! Error types for the hdocr-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the hdocr library.
#[derive(Error, Debug)]
pub enum HdocrError {
    /// Inference error from the model layer.
    #[error("inference error: {0}")]
    Inference(#[from] hdocr_inference::InferenceError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while enumerating an image source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The folder does not exist.
    #[error("folder does not exist: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a folder.
    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The folder could not be listed.
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Errors raised while staging image bytes to a temporary file.
#[derive(Error, Debug)]
pub enum StagingError {
    /// The temporary file could not be created.
    #[error("failed to create temporary file: {0}")]
    Create(String),

    /// The image bytes could not be written.
    #[error("failed to write image bytes: {0}")]
    Write(String),

    /// Nothing to stage.
    #[error("image data is empty")]
    Empty,
}

/// Result type for the hdocr library.
pub type Result<T> = std::result::Result<T, HdocrError>;
