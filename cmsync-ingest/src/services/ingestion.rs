//! Ingestion router: dispatch one CMS notification by its `_type`
//!
//! The two paths treat an unknown `_type` differently. A create/update for an
//! unknown kind is ignored and still counts as success; a delete for an
//! unknown kind is an error.

use cmsync_common::{time, DocumentStore};
use serde_json::Value;
use std::sync::Arc;

use super::{EntityMapper, EntitySynchronizer, SyncOutcome};
use crate::error::SyncError;
use crate::models::{raw, EntityKind};

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Synchronized(SyncOutcome),
    /// `_type` missing or not a mirrored kind
    Ignored { type_tag: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub kind: EntityKind,
    pub id: String,
}

pub struct IngestionRouter {
    store: Arc<dyn DocumentStore>,
    mapper: Arc<EntityMapper>,
    synchronizer: Arc<EntitySynchronizer>,
}

fn type_tag(payload: &Value) -> Option<String> {
    payload
        .get("_type")
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl IngestionRouter {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mapper: Arc<EntityMapper>,
        synchronizer: Arc<EntitySynchronizer>,
    ) -> Self {
        Self {
            store,
            mapper,
            synchronizer,
        }
    }

    /// Handle a create-or-update notification
    pub async fn create_or_update(&self, payload: Value) -> Result<IngestOutcome, SyncError> {
        let Some(kind) = raw::kind_of(&payload) else {
            let type_tag = type_tag(&payload);
            tracing::debug!(type_tag = ?type_tag, "Ignoring notification for unmirrored type");
            return Ok(IngestOutcome::Ignored { type_tag });
        };

        let record = self.mapper.map_payload(kind, payload, time::now())?;
        let outcome = self.synchronizer.synchronize(record).await?;
        Ok(IngestOutcome::Synchronized(outcome))
    }

    /// Handle a delete notification
    ///
    /// Removes exactly one document; relations pointing at it are left as is.
    pub async fn delete(&self, payload: Value) -> Result<DeleteOutcome, SyncError> {
        let Some(kind) = raw::kind_of(&payload) else {
            return Err(SyncError::UnsupportedKind(type_tag(&payload)));
        };

        let id = raw::id_of(&payload)
            .filter(|id| !id.trim().is_empty())
            .ok_or(SyncError::MissingId(kind))?
            .to_string();

        self.store.delete(kind.collection(), &id).await?;
        tracing::info!(%kind, id = %id, "Entity deleted");

        Ok(DeleteOutcome { kind, id })
    }
}
