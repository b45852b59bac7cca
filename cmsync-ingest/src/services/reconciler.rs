//! Reconciliation scanner: full CMS → store re-synchronization
//!
//! All three kinds are scanned concurrently. Within a kind, records flow
//! through the bounded [`FanOut`] pool. A failing record is skipped and
//! reported; it does not abort the rest of its kind.

use cmsync_common::time;
use serde_json::Value;
use std::sync::Arc;

use super::{BatchReport, EntityMapper, EntitySynchronizer, FanOut};
use crate::clients::ContentSource;
use crate::error::SyncError;
use crate::models::{raw, EntityKind};

pub struct ReconciliationScanner {
    content: Arc<dyn ContentSource>,
    mapper: Arc<EntityMapper>,
    synchronizer: Arc<EntitySynchronizer>,
    pool: FanOut,
}

impl ReconciliationScanner {
    pub fn new(
        content: Arc<dyn ContentSource>,
        mapper: Arc<EntityMapper>,
        synchronizer: Arc<EntitySynchronizer>,
        pool: FanOut,
    ) -> Self {
        Self {
            content,
            mapper,
            synchronizer,
            pool,
        }
    }

    /// Re-synchronize every record of every kind
    pub async fn reconcile_all(&self) -> BatchReport {
        tracing::info!("Reconciliation started");

        // Kinds are not ordered: a tenant may cascade before this run writes its
        // new locations, which then get `tenantId` on the next reconciliation.
        let (locations, tenants, translations) = tokio::join!(
            self.reconcile_kind(EntityKind::Location),
            self.reconcile_kind(EntityKind::Tenant),
            self.reconcile_kind(EntityKind::Translation),
        );

        let mut report = BatchReport::default();
        report.absorb(locations);
        report.absorb(tenants);
        report.absorb(translations);

        tracing::info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            "Reconciliation finished"
        );
        report
    }

    /// Re-synchronize every record of one kind
    pub async fn reconcile_kind(&self, kind: EntityKind) -> BatchReport {
        let payloads = match self.content.fetch_all(kind).await {
            Ok(payloads) => payloads,
            Err(e) => {
                tracing::error!(%kind, error = %e, "CMS fetch failed, kind not reconciled");
                return BatchReport::kind_failed(kind, SyncError::from(e));
            }
        };

        let items: Vec<(Option<String>, Value)> = payloads
            .into_iter()
            .map(|payload| (raw::id_of(&payload).map(str::to_string), payload))
            .collect();

        let mapper = &self.mapper;
        let synchronizer = &self.synchronizer;

        self.pool
            .run(kind, items, move |payload| async move {
                let record = mapper.map_payload(kind, payload, time::now())?;
                synchronizer.synchronize(record).await?;
                Ok::<(), SyncError>(())
            })
            .await
    }
}
