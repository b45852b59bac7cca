//! Synchronization core
//!
//! Control flow:
//! - notification → [`IngestionRouter`] → [`EntityMapper`] → [`EntitySynchronizer`]
//!   → (tenants only) [`RelationPropagator`]
//! - [`ReconciliationScanner`] reuses mapper and synchronizer per CMS record
//! - [`StalenessScheduler`] independently refreshes derived popular times

pub mod entity_mapper;
pub mod fan_out;
pub mod ingestion;
pub mod propagator;
pub mod reconciler;
pub mod side_computation;
pub mod staleness;
pub mod synchronizer;

pub use entity_mapper::EntityMapper;
pub use fan_out::{BatchReport, FanOut, ItemFailure};
pub use ingestion::{DeleteOutcome, IngestOutcome, IngestionRouter};
pub use propagator::{CascadeSummary, PropagationOutcome, RelationPropagator};
pub use reconciler::ReconciliationScanner;
pub use side_computation::best_effort;
pub use staleness::{RefreshSummary, StalenessScheduler};
pub use synchronizer::{EntitySynchronizer, Lifecycle, SyncOutcome, WriteDecision};
