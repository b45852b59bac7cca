//! Relation propagator: tenant → location `tenantId` cascade
//!
//! Only ever sets `tenantId`, never clears it, and never creates a location:
//! tenants and locations may arrive in either order, so a reference to a
//! location that does not exist yet is skipped.

use cmsync_common::{Document, DocumentStore};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::error::SyncError;
use crate::models::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOutcome {
    Applied,
    /// Referenced location does not exist yet
    Skipped,
}

/// Result of cascading one tenant onto all of its locations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub applied: usize,
    pub skipped: usize,
}

pub struct RelationPropagator {
    store: Arc<dyn DocumentStore>,
}

impl RelationPropagator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Merge `tenantId` onto one location if it exists
    pub async fn propagate(
        &self,
        tenant_id: &str,
        location_id: &str,
    ) -> Result<PropagationOutcome, SyncError> {
        let mut patch = Document::new();
        patch.insert("tenantId".to_string(), Value::String(tenant_id.to_string()));

        let applied = self
            .store
            .merge_existing(EntityKind::Location.collection(), location_id, patch)
            .await?;

        if applied {
            Ok(PropagationOutcome::Applied)
        } else {
            tracing::debug!(
                tenant_id,
                location_id,
                "Referenced location not found, skipping tenant cascade"
            );
            Ok(PropagationOutcome::Skipped)
        }
    }

    /// Cascade onto every referenced location concurrently
    ///
    /// Must only be called once the tenant document itself is written.
    pub async fn propagate_all(
        &self,
        tenant_id: &str,
        location_ids: &[String],
    ) -> Result<CascadeSummary, SyncError> {
        let outcomes = try_join_all(
            location_ids
                .iter()
                .map(|location_id| self.propagate(tenant_id, location_id)),
        )
        .await?;

        let applied = outcomes
            .iter()
            .filter(|outcome| **outcome == PropagationOutcome::Applied)
            .count();

        Ok(CascadeSummary {
            applied,
            skipped: outcomes.len() - applied,
        })
    }
}
