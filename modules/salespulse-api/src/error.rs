//! Error → HTTP status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use salespulse_adapters::SyncError;
use salespulse_common::{IngestError, QueryError};

use crate::renderer::RenderError;

pub fn ingest_status(err: &IngestError) -> StatusCode {
    match err {
        IngestError::UnknownPlatform(_) => StatusCode::NOT_FOUND,
        IngestError::AuthenticationFailed(_) => StatusCode::FORBIDDEN,
        // Retryable: lets the platform redeliver.
        IngestError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn query_status(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        QueryError::QueryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn sync_status(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Disabled => StatusCode::NOT_IMPLEMENTED,
        SyncError::Upstream { .. } | SyncError::Http(_) => StatusCode::BAD_GATEWAY,
        SyncError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn render_status(_err: &RenderError) -> StatusCode {
    StatusCode::BAD_GATEWAY
}

/// Body sent back to a platform whose delivery was not accepted.
pub fn rejection_body(err: &IngestError) -> serde_json::Value {
    let error = match err {
        IngestError::AuthenticationFailed(_) => "authentication failed".to_string(),
        IngestError::StoreUnavailable(_) => "store unavailable".to_string(),
        IngestError::UnknownPlatform(p) => format!("unknown platform: {p}"),
    };
    json!({ "accepted": false, "error": error })
}

pub fn ingest_error_response(err: &IngestError) -> Response {
    (ingest_status(err), Json(rejection_body(err))).into_response()
}

/// `{"error": ...}` with the given status.
pub fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use salespulse_common::Platform;

    #[test]
    fn ingest_errors_map_to_statuses() {
        assert_eq!(
            ingest_status(&IngestError::UnknownPlatform("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ingest_status(&IngestError::AuthenticationFailed(Platform::Braip)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ingest_status(&IngestError::StoreUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn query_errors_map_to_statuses() {
        assert_eq!(
            query_status(&QueryError::InvalidQuery("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            query_status(&QueryError::QueryFailed("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn sync_errors_map_to_statuses() {
        assert_eq!(sync_status(&SyncError::Disabled), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(sync_status(&SyncError::Upstream { status: 401 }), StatusCode::BAD_GATEWAY);
        assert_eq!(
            sync_status(&SyncError::Store("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn rejection_never_leaks_store_details() {
        let body = rejection_body(&IngestError::StoreUnavailable("password=hunter2".into()));
        assert_eq!(body, json!({"accepted": false, "error": "store unavailable"}));

        let body = rejection_body(&IngestError::AuthenticationFailed(Platform::Hubla));
        assert_eq!(body["error"], "authentication failed");
    }
}
