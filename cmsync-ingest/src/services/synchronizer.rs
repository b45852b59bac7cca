//! Entity synchronizer: create-vs-update per `(kind, id)`
//!
//! Each call observes the id's [`Lifecycle`] first and derives a named
//! [`WriteDecision`] from it:
//! - `Create`: the full record plus creation-only fields is written with
//!   replace semantics. Creation-only fields are `createdAt` for every kind,
//!   plus occupancy counters and initial popular times for locations.
//! - `Update`: the record is merged over the stored document; creation-only
//!   fields are never part of the record, so they survive every update.
//!
//! Exactly one document write happens per call, followed by the tenant
//! cascade for tenants.

use cmsync_common::{time, Document, DocumentStore, SetMode};
use std::sync::Arc;

use super::propagator::{CascadeSummary, RelationPropagator};
use super::side_computation::best_effort;
use crate::clients::AggregationEngine;
use crate::error::SyncError;
use crate::models::records::to_document;
use crate::models::{CanonicalRecord, EntityKind, LocationBaseline, PopularTimes};

/// Whether a document exists for an id at synchronization time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Absent,
    Present,
}

impl Lifecycle {
    pub fn decision(self) -> WriteDecision {
        match self {
            Lifecycle::Absent => WriteDecision::Create,
            Lifecycle::Present => WriteDecision::Update,
        }
    }
}

/// How a synchronized record is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub kind: EntityKind,
    pub id: String,
    pub decision: WriteDecision,
    /// Present for tenants only
    pub cascade: Option<CascadeSummary>,
}

pub struct EntitySynchronizer {
    store: Arc<dyn DocumentStore>,
    aggregation: Arc<dyn AggregationEngine>,
    propagator: RelationPropagator,
}

impl EntitySynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>, aggregation: Arc<dyn AggregationEngine>) -> Self {
        Self {
            propagator: RelationPropagator::new(store.clone()),
            store,
            aggregation,
        }
    }

    /// Observe whether `(kind, id)` already exists
    pub async fn lifecycle_of(&self, kind: EntityKind, id: &str) -> Result<Lifecycle, SyncError> {
        Ok(if self.store.exists(kind.collection(), id).await? {
            Lifecycle::Present
        } else {
            Lifecycle::Absent
        })
    }

    pub async fn synchronize(&self, record: CanonicalRecord) -> Result<SyncOutcome, SyncError> {
        let kind = record.kind();
        let id = record.id().to_string();
        let collection = kind.collection();

        let decision = self.lifecycle_of(kind, &id).await?.decision();
        let body = record.to_document()?;

        match decision {
            WriteDecision::Create => {
                let body = self.with_creation_fields(&record, body).await?;
                self.store.set(collection, &id, body, SetMode::Replace).await?;
            }
            WriteDecision::Update => {
                self.store.set(collection, &id, body, SetMode::Merge).await?;
            }
        }

        tracing::info!(%kind, id = %id, ?decision, "Entity synchronized");

        let cascade = match &record {
            CanonicalRecord::Tenant(tenant) => {
                let location_ids = tenant.locations.as_deref().unwrap_or_default();
                let summary = self.propagator.propagate_all(&tenant.id, location_ids).await?;
                tracing::debug!(
                    tenant_id = %tenant.id,
                    applied = summary.applied,
                    skipped = summary.skipped,
                    "Tenant cascade finished"
                );
                Some(summary)
            }
            CanonicalRecord::Location(_) | CanonicalRecord::Translation(_) => None,
        };

        Ok(SyncOutcome {
            kind,
            id,
            decision,
            cascade,
        })
    }

    /// Attach the fields written only when a document is first created
    async fn with_creation_fields(
        &self,
        record: &CanonicalRecord,
        mut body: Document,
    ) -> Result<Document, SyncError> {
        let now = time::now();

        match record {
            CanonicalRecord::Location(_) => {
                let mut baseline = LocationBaseline::new(now, PopularTimes::default());
                body.extend(to_document(&baseline)?);

                // Derived data must never block the primary write
                baseline.popular_times =
                    best_effort("initial popular times", self.aggregation.compute(&body, true))
                        .await;
                body.extend(to_document(&baseline)?);
            }
            CanonicalRecord::Tenant(tenant) => {
                insert_created_at(&mut body, tenant.source_created_at.unwrap_or(now))?;
            }
            CanonicalRecord::Translation(translation) => {
                insert_created_at(&mut body, translation.source_created_at.unwrap_or(now))?;
            }
        }

        Ok(body)
    }
}

fn insert_created_at(body: &mut Document, created_at: chrono::DateTime<chrono::Utc>) -> Result<(), SyncError> {
    body.insert("createdAt".to_string(), serde_json::to_value(created_at)?);
    Ok(())
}
