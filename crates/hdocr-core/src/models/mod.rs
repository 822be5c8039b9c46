//! Data models for hdocr.

pub mod config;
pub mod record;
pub mod result;

pub use config::{BatchConfig, ExtractionConfig, HdocrConfig, InferenceConfig};
pub use record::{Field, ProductRecord, TableRow};
pub use result::{BatchReport, ErrorKind, ItemResult};
