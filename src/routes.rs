use axum::{
    extract::State,
    http::{header, Method},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route(&state.config.server.route, any(handlers::translate_image))
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/ping", get(ping))
}

/// Full application: routes plus CORS and request tracing
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(&state))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Service banner naming the translate route
async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "translate_route": state.config.server.route,
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ocr_engine": state.ocr.engine_name(),
        "started_at": state.started_at,
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "pong": true }))
}
