//! Route-level behaviour of the translate endpoint, driven through the router

use axum::{
    body::{to_bytes, Body},
    extract::Query,
    http::{header, Method, Request, StatusCode},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::GenericImageView;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

use super::stubs::{
    image_server, sample_png, state_with, StubOcr, StubTranslator, IMAGE_HEIGHT, IMAGE_WIDTH,
};
use crate::config::{Config, TranslateConfig};
use crate::routes::build_app;
use crate::translate::MyMemoryTranslator;

const ROUTE: &str = "/api/translate-image";

async fn send(app: Router, method: Method, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let request = Request::builder()
        .method(method)
        .uri(ROUTE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn default_app(ocr_text: &str) -> (Router, Arc<StubOcr>, Arc<StubTranslator>) {
    let ocr = StubOcr::new(ocr_text);
    let translator = StubTranslator::echo();
    let app = build_app(state_with(Config::default(), ocr.clone(), translator.clone()));
    (app, ocr, translator)
}

#[tokio::test]
async fn options_returns_empty_ok_regardless_of_body() {
    let (app, ocr, _) = default_app("ignored");
    let (status, body) = send(app, Method::OPTIONS, Some(json!({ "garbage": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bare_options_is_answered_by_the_cors_layer() {
    let (app, ocr, _) = default_app("ignored");
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(ROUTE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn preflight_carries_cors_headers() {
    let (app, _, _) = default_app("ignored");
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(ROUTE)
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST") && methods.contains("OPTIONS"));
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.to_ascii_lowercase().contains("content-type"));
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let (app, _, _) = default_app("ignored");
        let (status, body) = send(app, method, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(as_json(&body), json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn post_without_image_url_is_bad_request() {
    let (app, ocr, _) = default_app("ignored");
    let (status, body) = send(app, Method::POST, Some(json!({ "targetLang": "ja" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body), json!({ "error": "Image URL is required" }));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_ocr_text_returns_the_original_bytes() {
    let base = image_server().await;
    let (app, _, translator) = default_app("  \n\t ");

    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/image.png", base) })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["translatedText"], "");
    assert_eq!(body["message"], "No text found in image");
    assert!(body.get("originalText").is_none());
    let returned = STANDARD.decode(body["translatedImage"].as_str().unwrap()).unwrap();
    assert_eq!(returned, sample_png());
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn recognized_text_is_translated_and_composited() {
    let base = image_server().await;
    let (app, ocr, translator) = default_app("Hello world\n");

    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/image.png", base), "targetLang": "ja" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["originalText"], "Hello world\n");
    assert_eq!(body["translatedText"], "[ja] Hello world");

    let encoded = STANDARD.decode(body["translatedImage"].as_str().unwrap()).unwrap();
    let decoded = image::load_from_memory(&encoded).unwrap();
    assert_eq!(decoded.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));

    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    assert_eq!(translator.calls(), 1);
}

#[tokio::test]
async fn omitted_target_lang_defaults_to_thai() {
    let base = image_server().await;
    let (app, _, translator) = default_app("Hello");

    let (status, _) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/image.png", base) })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let requests = translator.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target_lang, "th");
    assert_eq!(requests[0].source_lang, "auto");
}

#[tokio::test]
async fn failed_download_is_a_server_error_naming_the_status() {
    let base = image_server().await;
    let (app, ocr, _) = default_app("Hello");

    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/missing.png", base) })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = as_json(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to download image: 404");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_translation_is_a_server_error() {
    let base = image_server().await;
    let ocr = StubOcr::new("Hello");
    let app = build_app(state_with(Config::default(), ocr, StubTranslator::malformed()));

    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/image.png", base) })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = as_json(&body);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("responseData.translatedText"));
}

#[tokio::test]
async fn identical_requests_yield_identical_text() {
    let base = image_server().await;
    let request = json!({ "imageUrl": format!("{}/image.png", base), "targetLang": "de" });

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let (app, _, _) = default_app("Guten Tag");
        let (status, body) = send(app, Method::POST, Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let body = as_json(&body);
        outcomes.push((body["originalText"].clone(), body["translatedText"].clone()));
    }
    assert_eq!(outcomes[0], outcomes[1]);
}

#[tokio::test]
async fn translation_endpoint_receives_text_and_langpair() {
    let base = image_server().await;

    let translate_router = Router::new().route(
        "/get",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            Json(json!({
                "responseData": {
                    "translatedText": format!("{} ({})", params["q"], params["langpair"])
                }
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let translate_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, translate_router).await.unwrap();
    });

    let config = Config {
        translate: TranslateConfig {
            endpoint: format!("http://{}/get", translate_addr),
            ..TranslateConfig::default()
        },
        ..Config::default()
    };
    let translator = Arc::new(MyMemoryTranslator::new(reqwest::Client::new(), &config.translate));
    let app = build_app(state_with(config, StubOcr::new("Sale 50%"), translator));

    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "imageUrl": format!("{}/image.png", base) })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["translatedText"], "Sale 50% (auto|th)");
}

#[tokio::test]
async fn health_reports_engine() {
    let (app, _, _) = default_app("ignored");
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = as_json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ocr_engine"], "stub");
}

#[tokio::test]
async fn root_describes_the_service() {
    let (app, _, _) = default_app("ignored");
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = as_json(&body);
    assert_eq!(body["service"], "image-translate-backend");
    assert_eq!(body["translate_route"], ROUTE);
}
