use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use super::interface::OcrInterface;
use super::ocr_space::OcrSpaceOcr;
use super::tesseract::TesseractOcr;
use crate::config::{OcrConfig, OcrEngine};

/// Factory for creating OCR engines
pub struct OcrFactory;

impl OcrFactory {
    /// Create the OCR engine named by `ocr_config.engine`
    pub fn create_ocr(ocr_config: &OcrConfig, client: Client) -> Arc<dyn OcrInterface> {
        info!("Initializing OCR engine: {}", ocr_config.engine);
        match ocr_config.engine {
            OcrEngine::Tesseract => Arc::new(TesseractOcr::new(ocr_config)),
            OcrEngine::OcrSpace => Arc::new(OcrSpaceOcr::new(client, &ocr_config.ocr_space)),
        }
    }
}
