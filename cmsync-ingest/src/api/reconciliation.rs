//! Full reconciliation endpoint
//!
//! GET|POST /sanity/reconciliation

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// 204 when every record synchronized; otherwise 500 listing the failures
pub async fn reconcile(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let report = state.reconciler.reconcile_all().await;

    if report.is_clean() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Reconciliation(report))
    }
}

pub fn reconciliation_routes() -> Router<AppState> {
    Router::new().route("/sanity/reconciliation", get(reconcile).post(reconcile))
}
