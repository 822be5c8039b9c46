//! Inference backend implementations.

#[cfg(feature = "http")]
pub mod http;

use std::path::Path;

use crate::Result;

/// Trait for vision-language inference backends.
///
/// A backend reads one image and returns the model's raw text for it.
/// Callers invoke it once per image and never concurrently from the batch
/// loop, so implementations need not be reentrant beyond `Send + Sync`.
pub trait InferenceBackend: Send + Sync {
    /// Run the model on the image stored at `image`.
    fn infer(&self, image: &Path) -> Result<String>;

    /// Short human-readable name used in logs.
    fn name(&self) -> &str;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn infer(&self, image: &Path) -> Result<String> {
        (**self).infer(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &B {
    fn infer(&self, image: &Path) -> Result<String> {
        (**self).infer(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
