//! cmsync-ingest library interface
//!
//! Mirrors CMS content (locations, tenants, translations) into a document
//! store and keeps derived popular-times data fresh. Exposed as a library so
//! integration tests can build the router with test doubles.

pub mod api;
pub mod clients;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, SyncError};

use axum::Router;
use chrono::{DateTime, Utc};
use cmsync_common::config::SyncConfig;
use cmsync_common::DocumentStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::clients::{AggregationEngine, ContentSource, ImageUrlResolver};
use crate::services::{
    EntityMapper, EntitySynchronizer, FanOut, IngestionRouter, ReconciliationScanner,
    StalenessScheduler,
};

/// External collaborators the core is built from
pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    pub content: Arc<dyn ContentSource>,
    pub images: Arc<dyn ImageUrlResolver>,
    pub aggregation: Arc<dyn AggregationEngine>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionRouter>,
    pub reconciler: Arc<ReconciliationScanner>,
    pub scheduler: Arc<StalenessScheduler>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the synchronization core from its collaborators
    pub fn new(collaborators: Collaborators, sync: &SyncConfig) -> Self {
        let Collaborators {
            store,
            content,
            images,
            aggregation,
        } = collaborators;

        let pool = FanOut::new(sync.max_concurrency);
        let mapper = Arc::new(EntityMapper::new(images));
        let synchronizer = Arc::new(EntitySynchronizer::new(store.clone(), aggregation.clone()));

        Self {
            ingestion: Arc::new(IngestionRouter::new(
                store.clone(),
                mapper.clone(),
                synchronizer.clone(),
            )),
            reconciler: Arc::new(ReconciliationScanner::new(content, mapper, synchronizer, pool)),
            scheduler: Arc::new(StalenessScheduler::new(
                store,
                aggregation,
                pool,
                sync.stale_after_days,
            )),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::notification_routes())
        .merge(api::reconciliation_routes())
        .merge(api::popular_times_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
