//! Error types for cmsync-ingest
//!
//! [`SyncError`] covers failures inside the synchronization core.
//! [`ApiError`] is what HTTP handlers return: every variant renders as
//! `500 {"errorCode": ..., "error": ...}` with a fixed code per failure site,
//! so log lines and client reports can be correlated across deployments.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::clients::{AggregationError, CmsError};
use crate::models::EntityKind;
use crate::services::BatchReport;

/// Create-or-update notification failed
pub const CREATE_UPDATE_ERROR_CODE: &str = "6d3ed0cf-332f-4242-b730-34933aa1ab13";
/// Delete notification named a kind this service does not mirror
pub const UNSUPPORTED_TYPE_ERROR_CODE: &str = "e2597ab7-641c-4448-a70f-8781a027325b";
/// Delete notification failed
pub const DELETE_ERROR_CODE: &str = "c78f3b15-7a74-4360-ab62-079d45b5673b";
/// Full reconciliation finished with failures
pub const RECONCILIATION_ERROR_CODE: &str = "0b6f3a52-8d0e-4c1f-9a57-2f4e6c1d9b83";
/// Popular-times refresh could not start
pub const REFRESH_ERROR_CODE: &str = "4e9d1c07-5b2a-4f86-a3d8-7c1e0b92f6a4";

/// Synchronization core errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Document store failure; never retried here
    #[error("Store error: {0}")]
    Store(#[from] cmsync_common::Error),

    /// CMS query failure
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    /// Aggregation engine failure (only surfaces from the refresh path)
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// Payload fields have the wrong JSON types
    #[error("Malformed {kind} payload: {source}")]
    Payload {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    /// Payload has no usable `_id`
    #[error("{0} payload has no _id")]
    MissingId(EntityKind),

    /// Record could not be encoded as a document
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// `_type` does not name a mirrored kind
    #[error("unsupported document type")]
    UnsupportedKind(Option<String>),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    CreateUpdate(#[source] SyncError),

    #[error("unsupported document type")]
    UnsupportedDocumentType,

    #[error("{0}")]
    Delete(#[source] SyncError),

    #[error("reconciliation finished with {} failure(s) out of {} record(s)", .0.failed(), .0.attempted)]
    Reconciliation(BatchReport),

    #[error("{0}")]
    Refresh(#[source] SyncError),
}

impl ApiError {
    /// Fixed correlation id for this failure site
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::CreateUpdate(_) => CREATE_UPDATE_ERROR_CODE,
            ApiError::UnsupportedDocumentType => UNSUPPORTED_TYPE_ERROR_CODE,
            ApiError::Delete(_) => DELETE_ERROR_CODE,
            ApiError::Reconciliation(_) => RECONCILIATION_ERROR_CODE,
            ApiError::Refresh(_) => REFRESH_ERROR_CODE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_code = self.error_code();
        let message = self.to_string();

        tracing::error!(error_code, error = %message, "Request failed");

        let body = match self {
            ApiError::Reconciliation(report) => json!({
                "errorCode": error_code,
                "error": message,
                "failures": report.failures,
            }),
            _ => json!({
                "errorCode": error_code,
                "error": message,
            }),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
