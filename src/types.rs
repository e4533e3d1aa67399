use serde::{Deserialize, Serialize};

/// Body of a translate-image request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

/// Successful translate-image response.
///
/// `original_text` is omitted when no text was found; `message` is only
/// set in that case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslateImageResponse {
    pub success: bool,
    pub translated_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub const NO_TEXT_FOUND: &str = "No text found in image";

impl TranslateImageResponse {
    pub fn no_text(translated_image: String) -> Self {
        Self {
            success: true,
            translated_image,
            original_text: None,
            translated_text: String::new(),
            message: Some(NO_TEXT_FOUND.to_string()),
        }
    }

    pub fn translated(translated_image: String, original_text: String, translated_text: String) -> Self {
        Self {
            success: true,
            translated_image,
            original_text: Some(original_text),
            translated_text,
            message: None,
        }
    }
}
