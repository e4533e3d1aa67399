use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::state::AppState;
use crate::translate::TranslateRequest;
use crate::types::TranslateImageResponse;

/// A validated translate-image job
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateImageJob {
    pub image_url: String,
    pub target_lang: String,
}

/// Run fetch, OCR, translate and composite in order. Each step waits on the
/// previous one and every collaborator is called at most once.
pub async fn run(state: &AppState, job: &TranslateImageJob) -> AppResult<TranslateImageResponse> {
    let image = state.fetcher.fetch(&job.image_url).await?;

    let ocr_result = state.ocr.recognize(image.clone()).await?;
    if ocr_result.is_blank() {
        info!("No text found in image");
        return Ok(TranslateImageResponse::no_text(STANDARD.encode(&image)));
    }

    let request = TranslateRequest {
        text: ocr_result.text.clone(),
        source_lang: state.config.translate.source_lang.clone(),
        target_lang: job.target_lang.clone(),
    };
    let translation = state.translator.translate(&request).await?;

    let rendered = state
        .renderer
        .composite(image, &translation.translated_text)
        .await?;
    debug!(
        "Composited {}x{} image ({} bytes)",
        rendered.width,
        rendered.height,
        rendered.bytes.len()
    );

    Ok(TranslateImageResponse::translated(
        STANDARD.encode(&rendered.bytes),
        ocr_result.text,
        translation.translated_text,
    ))
}
