use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every way a translate request can fail.
///
/// The first three variants are client errors and keep the short
/// `{error}` body; everything else is reported as a 500 with
/// `{success: false, error}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Image URL is required")]
    MissingImageUrl,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to download image: {status}")]
    ImageDownload { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Malformed upstream response: {0}")]
    MalformedUpstream(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingImageUrl | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Render(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            json!({ "success": false, "error": self.to_string() })
        } else {
            json!({ "error": self.to_string() })
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
