//! Line-item extraction from raw model text.

mod json;
mod normalize;
pub mod rules;
mod table;

pub use json::JsonRowExtractor;
pub use normalize::{RecordNormalizer, normalize_name, normalize_rows};
pub use table::{ColumnMap, Layout, LineKind, TableExtractor, extract_rows};

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{ProductRecord, TableRow};

/// Trait for strategies that pull raw rows out of model text.
pub trait RowExtractor: Send + Sync {
    /// Extract rows in source order; an empty vector means nothing matched.
    fn extract_rows(&self, text: &str) -> Vec<TableRow>;

    /// Strategy name used in logs.
    fn name(&self) -> &'static str;
}

/// Full text-to-records pipeline: row strategies, then normalization.
///
/// Strategies are tried in order and the first one that yields rows wins,
/// so the JSON fallback only runs when no table was found.
pub struct ProductExtractor {
    strategies: Vec<Box<dyn RowExtractor>>,
    normalizer: RecordNormalizer,
}

impl ProductExtractor {
    /// Table extraction with the JSON fallback enabled.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Build the pipeline described by `config`.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut strategies: Vec<Box<dyn RowExtractor>> = vec![Box::new(
            TableExtractor::new().with_min_header_fields(config.min_header_fields),
        )];
        if config.json_fallback {
            strategies.push(Box::new(JsonRowExtractor::new()));
        }

        Self {
            strategies,
            normalizer: RecordNormalizer::new(),
        }
    }

    /// Extract normalized records; never fails, may be empty.
    pub fn extract(&self, text: &str) -> Vec<ProductRecord> {
        for strategy in &self.strategies {
            let rows = strategy.extract_rows(text);
            if rows.is_empty() {
                continue;
            }

            let records = self.normalizer.normalize_all(&rows);
            debug!(
                "{} strategy: {} rows, {} records after normalization",
                strategy.name(),
                rows.len(),
                records.len()
            );
            return records;
        }

        debug!("No line items found in {} chars of text", text.len());
        Vec::new()
    }
}

impl Default for ProductExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract normalized records with default settings.
pub fn extract_products(text: &str) -> Vec<ProductRecord> {
    ProductExtractor::new().extract(text)
}
