pub mod dashboard;
pub mod export;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use crate::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/", get(health))
        .route("/status", get(status))
        // Ingestion
        .route(
            "/webhook/cakto/sync",
            get(webhooks::cakto_sync).post(webhooks::cakto_sync),
        )
        .route("/webhook/{platform}", post(webhooks::receive))
        .route("/webhook/{platform}/", post(webhooks::receive))
        .route("/webhook/{platform}/test", get(webhooks::test))
        // Dashboard
        .route("/api/dashboard-data", get(dashboard::dashboard_data))
        .route("/api/export/csv", get(export::export_csv))
        .route("/api/export/excel", get(export::export_excel))
        .route("/api/export-pdf", post(export::export_pdf))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only: query strings can carry customer emails.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "salespulse",
        "endpoints": {
            "webhooks": ["/webhook/braip", "/webhook/hubla", "/webhook/kirvano", "/webhook/cakto"],
            "cakto_sync": "/webhook/cakto/sync",
            "dashboard": "/api/dashboard-data",
            "exports": ["/api/export/csv", "/api/export/excel", "/api/export-pdf"],
            "status": "/status",
        }
    }))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let secrets = &state.config.webhook_secrets;
    let platforms: serde_json::Map<String, serde_json::Value> = state
        .coordinator
        .registry()
        .platforms()
        .into_iter()
        .map(|p| {
            (
                p.to_string(),
                json!({ "secret_configured": secrets.for_platform(p).is_some() }),
            )
        })
        .collect();

    match state.store.count().await {
        Ok(records) => Json(json!({
            "status": "ok",
            "database": "connected",
            "records": records,
            "platforms": platforms,
            "cakto_sync": state.config.cakto_api_key.is_some(),
            "report_renderer": state.renderer.is_some(),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Status check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "database": "unavailable",
                    "platforms": platforms,
                })),
            )
                .into_response()
        }
    }
}
