//! Popular-times aggregation engine client
//!
//! The aggregation algorithm itself lives outside this service. This module
//! only knows how to ask for a result for one location.

use async_trait::async_trait;
use cmsync_common::config::AggregationConfig;
use cmsync_common::Document;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::PopularTimes;

/// Aggregation engine errors
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Aggregation engine not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Computes derived popular-times data for one location
///
/// May fail independently per call.
#[async_trait]
pub trait AggregationEngine: Send + Sync {
    async fn compute(&self, location: &Document, force: bool) -> Result<PopularTimes, AggregationError>;
}

#[derive(Serialize)]
struct ComputeRequest<'a> {
    location: &'a Document,
    force: bool,
}

/// Engine reached over HTTP: `POST {location, force}` returning a JSON array
pub struct HttpAggregationEngine {
    http_client: reqwest::Client,
    url: String,
}

impl HttpAggregationEngine {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AggregationError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AggregationEngine for HttpAggregationEngine {
    async fn compute(&self, location: &Document, force: bool) -> Result<PopularTimes, AggregationError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&ComputeRequest { location, force })
            .send()
            .await
            .map_err(|e| AggregationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AggregationError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<PopularTimes>()
            .await
            .map_err(|e| AggregationError::ParseError(e.to_string()))
    }
}

/// Stand-in used when no engine endpoint is configured; every call fails
pub struct DisabledAggregationEngine;

#[async_trait]
impl AggregationEngine for DisabledAggregationEngine {
    async fn compute(&self, _location: &Document, _force: bool) -> Result<PopularTimes, AggregationError> {
        Err(AggregationError::NotConfigured)
    }
}

/// Build the engine described by the configuration
pub fn from_config(config: &AggregationConfig) -> Result<Arc<dyn AggregationEngine>, AggregationError> {
    match &config.url {
        Some(url) => {
            tracing::info!(url = %url, "Popular-times aggregation engine enabled");
            Ok(Arc::new(HttpAggregationEngine::new(
                url.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        None => {
            tracing::warn!("No aggregation engine configured; popular times will stay empty");
            Ok(Arc::new(DisabledAggregationEngine))
        }
    }
}
