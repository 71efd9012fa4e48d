use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use salespulse_analytics::{DashboardParams, DashboardPayload, DashboardQuery};

use crate::error::{error_response, query_status, render_status};
use crate::export::{group_by_platform, newest_first, render_csv};
use crate::renderer::{ExcelRequest, RenderedReport, EXCEL_FILENAME};
use crate::routes::dashboard::today;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExcelParams {
    #[serde(flatten)]
    pub range: DashboardParams,
    pub upload_drive: Option<String>,
}

/// `"true"`, `"1"`, `"yes"` and `"on"` (any case) switch a flag on.
pub fn flag_enabled(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

fn attachment(content_type: &str, filename: &str, bytes: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn renderer_missing() -> Response {
    error_response(StatusCode::NOT_IMPLEMENTED, "report renderer not configured")
}

/// `GET /api/export/csv?platform&start_date&end_date`
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let query = match DashboardQuery::from_params(&params, today()) {
        Ok(query) => query,
        Err(e) => return error_response(query_status(&e), e),
    };
    let records = match state.engine.records(&query.filter()).await {
        Ok(records) => records,
        Err(e) => return error_response(query_status(&e), e),
    };

    match render_csv(&newest_first(&records)) {
        Ok(csv) => attachment("text/csv; charset=utf-8", "webhooks.csv", csv),
        Err(e) => {
            warn!(error = %e, "CSV rendering failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// `POST /api/export-pdf` with a dashboard payload as the body.
pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DashboardPayload>,
) -> Response {
    let Some(renderer) = state.renderer.as_ref() else {
        return renderer_missing();
    };

    match renderer.render_pdf(&payload).await {
        Ok(RenderedReport {
            content_type,
            bytes,
        }) => attachment(&content_type, "dashboard.pdf", bytes),
        Err(e) => {
            warn!(error = %e, "PDF rendering failed");
            error_response(render_status(&e), e)
        }
    }
}

/// `GET /api/export/excel?start_date&end_date&platform&upload_drive`
pub async fn export_excel(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExcelParams>,
) -> Response {
    let Some(renderer) = state.renderer.as_ref() else {
        return renderer_missing();
    };
    let query = match DashboardQuery::from_params(&params.range, today()) {
        Ok(query) => query,
        Err(e) => return error_response(query_status(&e), e),
    };
    let records = match state.engine.records(&query.filter()).await {
        Ok(records) => records,
        Err(e) => return error_response(query_status(&e), e),
    };

    let request = ExcelRequest {
        filename: EXCEL_FILENAME.to_string(),
        start_date: query.start_date,
        end_date: query.end_date,
        sheets: group_by_platform(newest_first(&records)),
        upload_drive: flag_enabled(params.upload_drive.as_deref()),
    };

    match renderer.render_excel(&request).await {
        Ok(RenderedReport {
            content_type,
            bytes,
        }) => attachment(&content_type, EXCEL_FILENAME, bytes),
        Err(e) => {
            warn!(error = %e, "Excel rendering failed");
            error_response(render_status(&e), e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_flag_parsing() {
        for on in ["true", "1", "YES", " on "] {
            assert!(flag_enabled(Some(on)), "{on}");
        }
        for off in ["false", "0", "", "maybe"] {
            assert!(!flag_enabled(Some(off)), "{off}");
        }
        assert!(!flag_enabled(None));
    }
}
