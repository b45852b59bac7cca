//! CMS webhook handlers
//!
//! POST /sanity/create-update, POST /sanity/delete
//!
//! A missing or non-JSON body is treated as an empty object, which the
//! create/update path ignores and the delete path rejects as unsupported.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;

use crate::error::{ApiError, ApiResult, SyncError};
use crate::services::IngestOutcome;
use crate::AppState;

fn payload_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(value)| value)
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// POST /sanity/create-update
///
/// 204 on success, including notifications for types that are not mirrored.
pub async fn create_or_update(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<StatusCode> {
    let outcome = state
        .ingestion
        .create_or_update(payload_or_empty(body))
        .await
        .map_err(ApiError::CreateUpdate)?;

    if let IngestOutcome::Synchronized(sync) = &outcome {
        tracing::debug!(kind = %sync.kind, id = %sync.id, decision = ?sync.decision, "Notification applied");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /sanity/delete
///
/// 204 on success; an unsupported `_type` is a single 500 response.
pub async fn delete(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<StatusCode> {
    match state.ingestion.delete(payload_or_empty(body)).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(SyncError::UnsupportedKind(type_tag)) => {
            tracing::warn!(type_tag = ?type_tag, "Delete requested for unsupported document type");
            Err(ApiError::UnsupportedDocumentType)
        }
        Err(e) => Err(ApiError::Delete(e)),
    }
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/sanity/create-update", post(create_or_update))
        .route("/sanity/delete", post(delete))
}
