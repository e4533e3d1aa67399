use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, field, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::pipeline::{self, TranslateImageJob};
use crate::state::AppState;
use crate::types::TranslateImageRequest;

/// Single entry point for the translate route. OPTIONS never gets here:
/// the CORS layer in `routes` answers every OPTIONS request with an empty
/// 200. Other non-POST methods are rejected before the body is parsed.
pub async fn translate_image(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        warn!("Rejected {} request", method);
        return AppError::MethodNotAllowed.into_response();
    }

    let span = info_span!(
        "translate_image",
        request_id = %Uuid::new_v4(),
        image_url = field::Empty,
        target_lang = field::Empty,
    );

    async move {
        let job = match parse_job(&body, &state.config.translate.default_target_lang) {
            Ok(job) => job,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return e.into_response();
            }
        };

        let span = tracing::Span::current();
        span.record("image_url", job.image_url.as_str());
        span.record("target_lang", job.target_lang.as_str());

        match pipeline::run(&state, &job).await {
            Ok(response) => {
                info!("Translate request completed");
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => {
                error!("Translation error: {:?}", e);
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Validate a POST body into a job. An empty body counts as `{}`.
pub fn parse_job(body: &[u8], default_target_lang: &str) -> AppResult<TranslateImageJob> {
    let request: TranslateImageRequest = if body.iter().all(u8::is_ascii_whitespace) {
        TranslateImageRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {}", e)))?
    };

    let image_url = request
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(AppError::MissingImageUrl)?;

    let is_http = reqwest::Url::parse(&image_url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_http {
        return Err(AppError::InvalidRequest(
            "Image URL must be an absolute http(s) URL".to_string(),
        ));
    }

    let target_lang = request
        .target_lang
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| default_target_lang.to_string());

    Ok(TranslateImageJob {
        image_url,
        target_lang,
    })
}
