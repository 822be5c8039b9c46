//! Per-image and per-batch outcomes.

use serde::{Deserialize, Serialize};

use super::record::ProductRecord;

/// Why a single image failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The model call failed or the image could not be read.
    InferenceError,
    /// The image bytes could not be written to a temporary file.
    StagingError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InferenceError => write!(f, "InferenceError"),
            ErrorKind::StagingError => write!(f, "StagingError"),
        }
    }
}

/// Outcome of processing one image.
///
/// A success with no products is a valid outcome: the model answered but
/// nothing in its text looked like a line-item table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemResult {
    Success {
        filename: String,
        raw_text: String,
        products: Vec<ProductRecord>,
    },
    Failure {
        filename: String,
        error_kind: ErrorKind,
        message: String,
    },
}

impl ItemResult {
    pub fn success(
        filename: impl Into<String>,
        raw_text: impl Into<String>,
        products: Vec<ProductRecord>,
    ) -> Self {
        Self::Success {
            filename: filename.into(),
            raw_text: raw_text.into(),
            products,
        }
    }

    pub fn failure(
        filename: impl Into<String>,
        error_kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            filename: filename.into(),
            error_kind,
            message: message.into(),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Success { filename, .. } | Self::Failure { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Extracted products; empty for failures.
    pub fn products(&self) -> &[ProductRecord] {
        match self {
            Self::Success { products, .. } => products,
            Self::Failure { .. } => &[],
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Success { raw_text, .. } => Some(raw_text),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<(ErrorKind, &str)> {
        match self {
            Self::Success { .. } => None,
            Self::Failure {
                error_kind,
                message,
                ..
            } => Some((*error_kind, message)),
        }
    }
}

/// Aggregate over a batch of images.
///
/// `successful + failed == total == results.len()` holds for every report
/// built through [`BatchReport::push`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Results in input order.
    pub results: Vec<ItemResult>,
    /// Set when the image source could not be enumerated at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
}

impl BatchReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty report for a source that could not be read.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            source_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Append one result, keeping the counters in step.
    pub fn push(&mut self, result: ItemResult) {
        self.total += 1;
        if result.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Total number of products across all successful items.
    pub fn product_count(&self) -> usize {
        self.results.iter().map(|r| r.products().len()).sum()
    }

    /// Failed results in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_keeps_counters_consistent() {
        let mut report = BatchReport::new();
        report.push(ItemResult::success("a.png", "", Vec::new()));
        report.push(ItemResult::failure("b.png", ErrorKind::InferenceError, "boom"));
        report.push(ItemResult::success("c.png", "", Vec::new()));

        assert_eq!(report.total, 3);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results.len(), 3);
        assert_eq!(
            report.failures().map(|r| r.filename()).collect::<Vec<_>>(),
            vec!["b.png"]
        );
    }

    #[test]
    fn test_item_result_serialization() {
        let failure = ItemResult::failure("b.png", ErrorKind::InferenceError, "boom");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error_kind"], "InferenceError");

        let report = BatchReport::new();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("source_error").is_none());
    }
}
