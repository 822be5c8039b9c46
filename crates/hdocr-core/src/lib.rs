//! Core library for Vietnamese invoice line-item extraction.
//!
//! This crate provides:
//! - Line-item table extraction from vision-language model text
//! - Normalization of names and Vietnamese-formatted amounts
//! - Single-image processing with scoped staging of uploaded bytes
//! - Sequential batch processing with per-image failure isolation

#[cfg(feature = "http")]
pub mod backend;
pub mod batch;
pub mod error;
pub mod invoice;
pub mod models;
pub mod processor;

pub use batch::{BatchObserver, BatchProcessor, DEFAULT_IMAGE_EXTENSIONS, FolderSource, ImageSource};
pub use error::{HdocrError, Result, SourceError, StagingError};
pub use invoice::{ProductExtractor, RowExtractor, extract_products};
pub use models::{
    BatchConfig, BatchReport, ErrorKind, ExtractionConfig, Field, HdocrConfig, InferenceConfig,
    ItemResult, ProductRecord, TableRow,
};
pub use processor::{ImageData, ImageItem, ImageProcessor, StagedImage};

/// Re-export inference types.
pub use hdocr_inference::{InferenceBackend, InferenceError};

#[cfg(feature = "http")]
pub use backend::create_backend;

#[cfg(feature = "http")]
pub use hdocr_inference::HttpVisionBackend;
