use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use salespulse_adapters::{import_orders, Accepted, CaktoClient};
use salespulse_common::Platform;

use crate::error::{error_response, ingest_error_response, sync_status};
use crate::AppState;

/// `POST /webhook/{platform}`: one delivery from a platform.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match state.coordinator.ingest(&platform, body, &headers).await {
        Ok(accepted) => Json(accepted_body(&accepted)).into_response(),
        Err(e) => ingest_error_response(&e),
    }
}

pub fn accepted_body(accepted: &Accepted) -> serde_json::Value {
    json!({
        "accepted": true,
        "normalized": accepted.normalized,
        "id": accepted.id,
        "platform": accepted.platform,
        "event_type": accepted.event_type,
        "transaction_id": accepted.transaction_id,
    })
}

/// `GET /webhook/{platform}/test`: reports whether a secret is configured.
pub async fn test(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> Response {
    let Ok(platform) = platform.parse::<Platform>() else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown platform: {platform}"));
    };

    Json(json!({
        "status": "ok",
        "message": format!("{platform} webhook is working"),
        "endpoint": format!("/webhook/{platform}"),
        "auth": {
            "secret_configured": state.config.webhook_secrets.for_platform(platform).is_some(),
        }
    }))
    .into_response()
}

/// `GET|POST /webhook/cakto/sync`: pull orders from the Cakto API.
pub async fn cakto_sync(State(state): State<Arc<AppState>>) -> Response {
    let client = match CaktoClient::from_config(&state.config, state.http_client.clone()) {
        Ok(client) => client,
        Err(e) => return error_response(sync_status(&e), e),
    };

    let orders = match client.fetch_orders().await {
        Ok(orders) => orders,
        Err(e) => {
            warn!(error = %e, "Cakto order fetch failed");
            return error_response(sync_status(&e), e);
        }
    };

    match import_orders(state.store.as_ref(), orders).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(sync_status(&e), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_body_reports_normalization() {
        let accepted = Accepted {
            id: 7,
            platform: Platform::Kirvano,
            normalized: false,
            event_type: "unprocessed".into(),
            transaction_id: None,
            normalization_error: None,
        };
        let body = accepted_body(&accepted);
        assert_eq!(body["accepted"], true);
        assert_eq!(body["normalized"], false);
        assert_eq!(body["id"], 7);
        assert_eq!(body["platform"], "kirvano");
    }
}
