use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// Translation provider interface
#[async_trait]
pub trait TranslateInterface: Send + Sync {
    /// Translate `request.text`; called exactly once per request, no retries
    async fn translate(&self, request: &TranslateRequest) -> AppResult<TranslateResponse>;
}
