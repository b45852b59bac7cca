//! Popular-times refresh endpoint
//!
//! GET|POST /popular-times/aggregate?force=true

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub force: Option<String>,
}

impl RefreshQuery {
    /// Only the exact value `true` forces a full refresh
    pub fn is_forced(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    /// Locations whose aggregation or write failed
    pub failed: usize,
}

/// The count reported is the number of locations dispatched, not the number
/// that completed successfully.
pub async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> ApiResult<Json<RefreshResponse>> {
    let summary = state
        .scheduler
        .refresh_stale(query.is_forced())
        .await
        .map_err(ApiError::Refresh)?;

    Ok(Json(RefreshResponse {
        message: format!("updated popular times for {} locations", summary.dispatched),
        failed: summary.report.failed(),
    }))
}

pub fn popular_times_routes() -> Router<AppState> {
    Router::new().route("/popular-times/aggregate", get(refresh).post(refresh))
}
