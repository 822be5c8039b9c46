//! Single-image processing: stage, infer once, extract.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use hdocr_inference::InferenceBackend;

use crate::error::StagingError;
use crate::invoice::ProductExtractor;
use crate::models::config::HdocrConfig;
use crate::models::result::{ErrorKind, ItemResult};

/// Where the image for one item comes from.
#[derive(Debug, Clone)]
pub enum ImageData {
    /// Image already on disk, handed to the backend as-is.
    Path(PathBuf),
    /// Raw bytes (upload, stdin) that have to be staged first.
    Bytes(Vec<u8>),
}

/// One image to process, with the filename used for reporting.
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub filename: String,
    pub data: ImageData,
}

impl ImageItem {
    /// Item for a file on disk, reported under its file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            filename,
            data: ImageData::Path(path),
        }
    }

    /// Item for in-memory bytes.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data: ImageData::Bytes(bytes),
        }
    }
}

/// An image path that is valid for the lifetime of this value.
///
/// Staged bytes live in a [`NamedTempFile`], removed when this is dropped.
#[derive(Debug)]
pub enum StagedImage {
    Borrowed(PathBuf),
    Temp(NamedTempFile),
}

impl StagedImage {
    /// Stage `item` so the backend can read it from a path.
    pub fn stage(item: &ImageItem, dir: Option<&Path>) -> Result<Self, StagingError> {
        let bytes = match &item.data {
            ImageData::Path(path) => return Ok(Self::Borrowed(path.clone())),
            ImageData::Bytes(bytes) => bytes,
        };
        if bytes.is_empty() {
            return Err(StagingError::Empty);
        }

        let (prefix, suffix) = temp_name_parts(&item.filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| StagingError::Create(e.to_string()))?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| StagingError::Write(e.to_string()))?;

        debug!("Staged {} bytes at {}", bytes.len(), file.path().display());
        Ok(Self::Temp(file))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Borrowed(path) => path,
            Self::Temp(file) => file.path(),
        }
    }
}

/// Prefix from the sanitized file stem, suffix keeps the extension so the
/// image decoder can still guess the format.
fn temp_name_parts(filename: &str) -> (String, String) {
    let name = Path::new(filename);
    let stem: String = name
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(32)
        .collect();

    let suffix = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    (format!("hdocr-{}-", stem), suffix)
}

/// Runs one image through the backend and the extraction pipeline.
pub struct ImageProcessor<B: InferenceBackend> {
    backend: B,
    extractor: ProductExtractor,
    staging_dir: Option<PathBuf>,
}

impl<B: InferenceBackend> ImageProcessor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            extractor: ProductExtractor::new(),
            staging_dir: None,
        }
    }

    /// Processor using the extraction and staging settings from `config`.
    pub fn with_config(backend: B, config: &HdocrConfig) -> Self {
        Self {
            backend,
            extractor: ProductExtractor::from_config(&config.extraction),
            staging_dir: config.batch.staging_dir.clone(),
        }
    }

    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Process one image. Never fails: every error becomes a
    /// [`ItemResult::Failure`].
    pub fn process(&self, item: &ImageItem) -> ItemResult {
        info!("Processing {} with {}", item.filename, self.backend.name());

        let staged = match StagedImage::stage(item, self.staging_dir.as_deref()) {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Cannot stage {}: {}", item.filename, e);
                return ItemResult::failure(&item.filename, ErrorKind::StagingError, e.to_string());
            }
        };

        let outcome = self.infer(staged.path());
        drop(staged);

        match outcome {
            Ok(raw_text) => {
                let products = self.extractor.extract(&raw_text);
                debug!(
                    "{}: {} products from {} chars",
                    item.filename,
                    products.len(),
                    raw_text.len()
                );
                ItemResult::success(&item.filename, raw_text, products)
            }
            Err(message) => {
                warn!("Inference failed for {}: {}", item.filename, message);
                ItemResult::failure(&item.filename, ErrorKind::InferenceError, message)
            }
        }
    }

    /// Single backend call; a panicking backend counts as a failed call.
    fn infer(&self, path: &Path) -> Result<String, String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.backend.infer(path))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("backend panicked: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdocr_inference::InferenceError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const TABLE: &str = "| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n| Coca Cola | 2 | 10.000 | 20.000 |";

    /// Returns a fixed answer and remembers what it was asked about.
    struct ScriptedBackend {
        answer: Result<String, String>,
        seen: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl ScriptedBackend {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<(PathBuf, bool)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl InferenceBackend for ScriptedBackend {
        fn infer(&self, image: &Path) -> hdocr_inference::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((image.to_path_buf(), image.exists()));
            self.answer
                .clone()
                .map_err(InferenceError::InvalidImage)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct PanickingBackend;

    impl InferenceBackend for PanickingBackend {
        fn infer(&self, _image: &Path) -> hdocr_inference::Result<String> {
            panic!("model crashed");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_success_with_products() {
        let processor = ImageProcessor::new(ScriptedBackend::answering(TABLE));
        let result = processor.process(&ImageItem::from_path("/data/hoa-don.png"));

        assert!(result.is_success());
        assert_eq!(result.filename(), "hoa-don.png");
        assert_eq!(result.raw_text(), Some(TABLE));
        assert_eq!(result.products().len(), 1);
        assert_eq!(result.products()[0].unit_price, "10000");

        let seen = processor.backend().seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, PathBuf::from("/data/hoa-don.png"));
    }

    #[test]
    fn test_no_table_is_empty_success() {
        let processor = ImageProcessor::new(ScriptedBackend::answering("Cảm ơn quý khách!"));
        let result = processor.process(&ImageItem::from_path("receipt.jpg"));

        assert!(result.is_success());
        assert!(result.products().is_empty());
    }

    #[test]
    fn test_inference_failure() {
        let processor = ImageProcessor::new(ScriptedBackend::failing("cannot decode"));
        let result = processor.process(&ImageItem::from_path("broken.png"));

        let (kind, message) = result.error().unwrap();
        assert_eq!(kind, ErrorKind::InferenceError);
        assert!(message.contains("cannot decode"));
        assert_eq!(result.raw_text(), None);
    }

    #[test]
    fn test_panicking_backend_is_failure() {
        let processor = ImageProcessor::new(PanickingBackend);
        let result = processor.process(&ImageItem::from_path("boom.png"));

        let (kind, message) = result.error().unwrap();
        assert_eq!(kind, ErrorKind::InferenceError);
        assert!(message.contains("model crashed"));
    }

    #[test]
    fn test_staged_file_removed_on_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [ScriptedBackend::answering(TABLE), ScriptedBackend::failing("boom")] {
            let processor =
                ImageProcessor::new(backend).with_staging_dir(Some(dir.path().to_path_buf()));
            processor.process(&ImageItem::from_bytes("Hóa đơn 01.PNG", vec![0x89, b'P', b'N', b'G']));

            let seen = processor.backend().seen();
            assert_eq!(seen.len(), 1);
            let (path, existed) = &seen[0];
            assert!(existed);
            assert!(path.starts_with(dir.path()));
            assert_eq!(path.extension().unwrap(), "png");
            assert!(!path.exists());
        }

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_bytes_is_staging_error() {
        let processor = ImageProcessor::new(ScriptedBackend::answering(TABLE));
        let result = processor.process(&ImageItem::from_bytes("empty.png", Vec::new()));

        assert_eq!(result.error().unwrap().0, ErrorKind::StagingError);
        assert!(processor.backend().seen().is_empty());
    }

    #[test]
    fn test_missing_staging_dir_is_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::new(ScriptedBackend::answering(TABLE))
            .with_staging_dir(Some(dir.path().join("missing")));
        let result = processor.process(&ImageItem::from_bytes("a.png", vec![1, 2, 3]));

        assert_eq!(result.error().unwrap().0, ErrorKind::StagingError);
        assert!(processor.backend().seen().is_empty());
    }

    #[test]
    fn test_temp_name_parts() {
        assert_eq!(
            temp_name_parts("Hóa đơn 01.PNG"),
            ("hdocr-Han01-".to_string(), ".png".to_string())
        );
        assert_eq!(temp_name_parts("stdin"), ("hdocr-stdin-".to_string(), String::new()));
    }
}
