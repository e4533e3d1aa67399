use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::interface::{TranslateInterface, TranslateRequest, TranslateResponse};
use crate::config::TranslateConfig;
use crate::error::{AppError, AppResult};

/// MyMemory free-tier translation API client
pub struct MyMemoryTranslator {
    client: Client,
    endpoint: String,
    contact_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: Option<String>,
}

impl MyMemoryTranslator {
    pub fn new(client: Client, config: &TranslateConfig) -> Self {
        info!("Initialized MyMemory translator: endpoint={}", config.endpoint);
        Self {
            client,
            endpoint: config.endpoint.clone(),
            contact_email: config.contact_email.clone(),
        }
    }

    fn query(&self, request: &TranslateRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("q", request.text.clone()),
            (
                "langpair",
                format!("{}|{}", request.source_lang, request.target_lang),
            ),
        ];
        if let Some(email) = &self.contact_email {
            query.push(("de", email.clone()));
        }
        query
    }
}

/// Pull `responseData.translatedText` out of a MyMemory body
fn extract_translation(body: &str) -> AppResult<String> {
    let parsed: MyMemoryResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MalformedUpstream(format!("translation body is not valid JSON: {}", e)))?;

    parsed
        .response_data
        .and_then(|data| data.translated_text)
        .ok_or_else(|| {
            AppError::MalformedUpstream("translation response has no responseData.translatedText".to_string())
        })
}

#[async_trait]
impl TranslateInterface for MyMemoryTranslator {
    async fn translate(&self, request: &TranslateRequest) -> AppResult<TranslateResponse> {
        debug!(
            "Translating {} characters {}|{}",
            request.text.chars().count(),
            request.source_lang,
            request.target_lang
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Translation(format!(
                "translation service returned status {}",
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        let translated_text = extract_translation(&body)?;
        debug!("Translated text: {}", translated_text);
        Ok(TranslateResponse { translated_text })
    }
}
