use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppResult;

/// Text recognized in one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResult {
    pub text: String,
}

impl OcrResult {
    /// True when the engine produced nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// OCR engine interface
#[async_trait]
pub trait OcrInterface: Send + Sync {
    /// Recognize text in the encoded image bytes.
    ///
    /// Implementations may block on CPU-bound work but must do so off the
    /// async executor.
    async fn recognize(&self, image: Bytes) -> AppResult<OcrResult>;

    /// Short engine name, reported by the health route
    fn engine_name(&self) -> &'static str;
}
