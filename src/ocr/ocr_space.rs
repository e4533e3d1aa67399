use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::interface::{OcrInterface, OcrResult};
use crate::config::OcrSpaceConfig;
use crate::error::{AppError, AppResult};

/// Remote OCR through the OCR.space parse API
pub struct OcrSpaceOcr {
    client: Client,
    endpoint: String,
    api_key: String,
    language: String,
    engine: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceOcr {
    pub fn new(client: Client, config: &OcrSpaceConfig) -> Self {
        info!(
            "Initialized OCR.space OCR: endpoint={}, language={}, engine={}",
            config.endpoint, config.language, config.engine
        );
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            engine: config.engine,
        }
    }
}

/// `ErrorMessage` is either a string or a list of strings
fn describe_error(message: Option<&Value>) -> String {
    match message {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => "unknown error".to_string(),
    }
}

#[async_trait]
impl OcrInterface for OcrSpaceOcr {
    async fn recognize(&self, image: Bytes) -> AppResult<OcrResult> {
        let mime = image::guess_format(&image)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/png");
        let data_uri = format!("data:{};base64,{}", mime, STANDARD.encode(&image));

        let form = Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", self.language.clone())
            .text("OCREngine", self.engine.to_string())
            .text("base64Image", data_uri);

        info!("Sending {} bytes to OCR.space", image.len());
        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Ocr(format!("OCR.space returned status {}", status.as_u16())));
        }

        let body = response.text().await?;
        let parsed: OcrSpaceResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::MalformedUpstream(format!("OCR.space body: {}", e)))?;

        if parsed.is_errored_on_processing {
            return Err(AppError::Ocr(describe_error(parsed.error_message.as_ref())));
        }

        let text = parsed
            .parsed_results
            .into_iter()
            .map(|r| r.parsed_text)
            .collect::<Vec<_>>()
            .join("\n");
        debug!("OCR.space returned {} characters", text.chars().count());
        Ok(OcrResult { text })
    }

    fn engine_name(&self) -> &'static str {
        "ocr_space"
    }
}
