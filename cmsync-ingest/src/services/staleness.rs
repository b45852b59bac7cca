//! Staleness scheduler: refresh popular times of stale locations
//!
//! A location is stale when the whole days elapsed since its `updatedAt`
//! exceed the configured threshold. A missing or unparseable `updatedAt` is
//! never stale; only a forced refresh selects such a location.

use chrono::{DateTime, Utc};
use cmsync_common::time::{self, parse_timestamp, whole_days_between};
use cmsync_common::{Document, DocumentStore, StoredDocument};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{BatchReport, FanOut};
use crate::clients::AggregationEngine;
use crate::error::SyncError;
use crate::models::records::to_document;
use crate::models::{EntityKind, PopularTimes};

/// Outcome of one refresh run
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSummary {
    /// Locations submitted to the aggregation engine
    pub dispatched: usize,
    pub report: BatchReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PopularTimesPatch {
    popular_times: PopularTimes,
    updated_at: DateTime<Utc>,
}

/// Whether a stored location is due for a refresh
pub fn is_stale(location: &Document, now: DateTime<Utc>, stale_after_days: i64) -> bool {
    location
        .get("updatedAt")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .is_some_and(|updated_at| whole_days_between(updated_at, now) > stale_after_days)
}

/// Pick the locations a refresh run should submit
pub fn select_for_refresh(
    locations: Vec<StoredDocument>,
    now: DateTime<Utc>,
    stale_after_days: i64,
    force_all: bool,
) -> Vec<StoredDocument> {
    locations
        .into_iter()
        .filter(|location| force_all || is_stale(&location.body, now, stale_after_days))
        .collect()
}

pub struct StalenessScheduler {
    store: Arc<dyn DocumentStore>,
    aggregation: Arc<dyn AggregationEngine>,
    pool: FanOut,
    stale_after_days: i64,
}

impl StalenessScheduler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        aggregation: Arc<dyn AggregationEngine>,
        pool: FanOut,
        stale_after_days: i64,
    ) -> Self {
        Self {
            store,
            aggregation,
            pool,
            stale_after_days,
        }
    }

    /// Refresh stale locations, or all of them when `force_all` is set
    ///
    /// Fails only if the location scan fails; per-location aggregation
    /// failures are collected in the summary's report.
    pub async fn refresh_stale(&self, force_all: bool) -> Result<RefreshSummary, SyncError> {
        let now = time::now();
        let locations = self.store.scan(EntityKind::Location.collection()).await?;
        let scanned = locations.len();

        let selected = select_for_refresh(locations, now, self.stale_after_days, force_all);
        let dispatched = selected.len();

        tracing::info!(
            scanned,
            dispatched,
            force_all,
            stale_after_days = self.stale_after_days,
            "Refreshing popular times"
        );

        let items = selected
            .into_iter()
            .map(|location| (Some(location.id.clone()), location))
            .collect();

        let report = self
            .pool
            .run(EntityKind::Location, items, |location| self.refresh_one(location))
            .await;

        Ok(RefreshSummary { dispatched, report })
    }

    async fn refresh_one(&self, location: StoredDocument) -> Result<(), SyncError> {
        let popular_times = self.aggregation.compute(&location.body, false).await?;

        let patch = to_document(&PopularTimesPatch {
            popular_times,
            updated_at: time::now(),
        })?;
        let updated = self
            .store
            .merge_existing(EntityKind::Location.collection(), &location.id, patch)
            .await?;
        if !updated {
            tracing::info!(id = %location.id, "Location deleted during refresh, result dropped");
        }

        Ok(())
    }
}
