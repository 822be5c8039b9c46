//! Batch orchestration over a folder (or any ordered set) of images.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use hdocr_inference::InferenceBackend;

use crate::error::SourceError;
use crate::models::result::{BatchReport, ItemResult};
use crate::processor::{ImageItem, ImageProcessor};

/// Extensions picked up from a folder when nothing else is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// A finite, ordered collection of images.
pub trait ImageSource {
    fn images(&self) -> Result<Vec<ImageItem>, SourceError>;
}

impl ImageSource for Vec<ImageItem> {
    fn images(&self) -> Result<Vec<ImageItem>, SourceError> {
        Ok(self.clone())
    }
}

/// Image files directly inside one folder, sorted by file name.
#[derive(Debug, Clone)]
pub struct FolderSource {
    path: PathBuf,
    allowed_extensions: Vec<String>,
}

impl FolderSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            allowed_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.allowed_extensions.iter().any(|a| *a == ext))
    }
}

impl ImageSource for FolderSource {
    fn images(&self) -> Result<Vec<ImageItem>, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.clone()));
        }
        if !self.path.is_dir() {
            return Err(SourceError::NotADirectory(self.path.clone()));
        }

        let unreadable = |e: std::io::Error| SourceError::Unreadable {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && self.is_allowed(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        debug!("{} images in {}", files.len(), self.path.display());
        Ok(files.into_iter().map(ImageItem::from_path).collect())
    }
}

/// Callbacks for following a batch as it runs.
pub trait BatchObserver {
    /// Called before the first item with the expected number of items.
    ///
    /// For lazy inputs this is the iterator's size hint (its upper bound,
    /// or the lower bound when unbounded), so it can undercount.
    fn on_start(&mut self, _total: usize) {}

    /// Called after each item, in input order.
    fn on_result(&mut self, _index: usize, _result: &ItemResult) {}
}

impl BatchObserver for () {}

/// Processes images one at a time and folds the outcomes into a report.
pub struct BatchProcessor<B: InferenceBackend> {
    processor: ImageProcessor<B>,
}

impl<B: InferenceBackend> BatchProcessor<B> {
    pub fn new(processor: ImageProcessor<B>) -> Self {
        Self { processor }
    }

    /// Process everything `source` yields. An unavailable source gives an
    /// empty report with `source_error` set.
    pub fn process_folder(&self, source: &impl ImageSource) -> BatchReport {
        self.process_folder_observed(source, &mut ())
    }

    pub fn process_folder_observed(
        &self,
        source: &impl ImageSource,
        observer: &mut impl BatchObserver,
    ) -> BatchReport {
        match source.images() {
            Ok(items) => self.process_items_observed(items, observer),
            Err(e) => {
                warn!("Image source unavailable: {}", e);
                observer.on_start(0);
                BatchReport::unavailable(e.to_string())
            }
        }
    }

    pub fn process_items(&self, items: impl IntoIterator<Item = ImageItem>) -> BatchReport {
        self.process_items_observed(items, &mut ())
    }

    /// Process items in order; a failing item never stops the loop.
    ///
    /// Items are pulled one at a time, so only the current item's bytes are
    /// held in memory.
    pub fn process_items_observed(
        &self,
        items: impl IntoIterator<Item = ImageItem>,
        observer: &mut impl BatchObserver,
    ) -> BatchReport {
        let items = items.into_iter();
        let (lower, upper) = items.size_hint();
        let expected = upper.unwrap_or(lower);
        info!("Starting batch of {} images", expected);
        observer.on_start(expected);

        let mut report = BatchReport::new();
        for (index, item) in items.enumerate() {
            let result = self.processor.process(&item);
            observer.on_result(index, &result);
            report.push(result);
        }

        info!(
            "Batch finished: {} total, {} successful, {} failed",
            report.total, report.successful, report.failed
        );
        report
    }
}
