use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
};
use chrono::{NaiveDate, Utc};
use tracing::warn;

use salespulse_analytics::{DashboardParams, DashboardQuery};

use crate::error::{error_response, query_status};
use crate::AppState;

/// Today's date in UTC, the anchor for default windows.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `GET /api/dashboard-data?start_date&end_date&top_n&platform`
pub async fn dashboard_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let query = match DashboardQuery::from_params(&params, today()) {
        Ok(query) => query,
        Err(e) => return error_response(query_status(&e), e),
    };

    match state.engine.compute(&query).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(error = %e, "Dashboard aggregation failed");
            error_response(query_status(&e), e)
        }
    }
}
