use async_trait::async_trait;
use bytes::Bytes;
use rusty_tesseract::{Args, Image as TesseractImage};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::interface::{OcrInterface, OcrResult};
use crate::config::OcrConfig;
use crate::error::{AppError, AppResult};

/// Local Tesseract OCR, driven through the `tesseract` executable
pub struct TesseractOcr {
    languages: String,
    page_seg_mode: i32,
    dpi: Option<i32>,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        info!(
            "Initialized Tesseract OCR: languages={}, psm={}",
            config.languages, config.page_seg_mode
        );
        Self {
            languages: config.languages.clone(),
            page_seg_mode: config.page_seg_mode,
            dpi: config.dpi,
        }
    }

    pub fn args(&self) -> Args {
        let defaults = Args::default();
        Args {
            lang: self.languages.clone(),
            psm: Some(self.page_seg_mode),
            dpi: self.dpi.or(defaults.dpi),
            ..defaults
        }
    }

    /// Tesseract reads from disk, so the bytes go to a scratch file whose
    /// extension matches the sniffed format.
    fn recognize_blocking(image: &[u8], args: &Args) -> AppResult<String> {
        let format = image::guess_format(image)
            .map_err(|e| AppError::Ocr(format!("Unrecognized image format: {}", e)))?;

        if let Ok(reader) = image::ImageReader::new(Cursor::new(image)).with_guessed_format() {
            if let Ok((width, height)) = reader.into_dimensions() {
                debug!("OCR input: {:?} {}x{}", format, width, height);
            }
        }

        let extension = format.extensions_str().first().copied().unwrap_or("png");
        let path = scratch_path(extension);
        fs::write(&path, image)
            .map_err(|e| AppError::Ocr(format!("Failed to stage image for OCR: {}", e)))?;

        let result = TesseractImage::from_path(path.clone())
            .and_then(|img| rusty_tesseract::image_to_string(&img, args));

        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove OCR scratch file {}: {}", path.display(), e);
        }

        result.map_err(|e| AppError::Ocr(e.to_string()))
    }
}

fn scratch_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("image-translate-{}.{}", Uuid::new_v4(), extension))
}

#[async_trait]
impl OcrInterface for TesseractOcr {
    async fn recognize(&self, image: Bytes) -> AppResult<OcrResult> {
        info!("Starting text extraction ({} bytes)", image.len());
        let args = self.args();

        let text = tokio::task::spawn_blocking(move || Self::recognize_blocking(&image, &args))
            .await
            .map_err(|e| AppError::Ocr(format!("OCR task failed: {}", e)))??;

        info!("Text extraction complete: {} characters", text.chars().count());
        debug!("Extracted text: {}", text);
        Ok(OcrResult { text })
    }

    fn engine_name(&self) -> &'static str {
        "tesseract"
    }
}
