//! Bounded-concurrency batch execution
//!
//! Batches (reconciliation, popular-times refresh) run their items through a
//! `buffer_unordered` pool capped at `max_concurrency`. Every item is
//! attempted; failures are collected into a [`BatchReport`] instead of
//! aborting the batch.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;

use crate::models::EntityKind;

/// One failed item of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub kind: EntityKind,
    /// `None` when the failure hit the whole kind (e.g. the CMS fetch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error: String,
}

/// Per-item outcome summary of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    /// A kind that failed before any of its items could run
    pub fn kind_failed(kind: EntityKind, error: impl Display) -> Self {
        Self {
            attempted: 0,
            succeeded: 0,
            failures: vec![ItemFailure {
                kind,
                id: None,
                error: error.to_string(),
            }],
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn absorb(&mut self, other: BatchReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }
}

/// Worker pool with a fixed concurrency cap
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    max_concurrency: usize,
}

impl FanOut {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run `work` over every item, at most `max_concurrency` at a time
    ///
    /// Items are `(id, item)` pairs; the id only labels failures.
    pub async fn run<T, F, Fut, E>(
        &self,
        kind: EntityKind,
        items: Vec<(Option<String>, T)>,
        work: F,
    ) -> BatchReport
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let attempted = items.len();

        let outcomes: Vec<(Option<String>, Result<(), E>)> = stream::iter(items)
            .map(|(id, item)| {
                let pending = work(item);
                async move { (id, pending.await) }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = BatchReport {
            attempted,
            ..BatchReport::default()
        };

        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(%kind, id = id.as_deref().unwrap_or("<none>"), error = %e, "Batch item failed");
                    report.failures.push(ItemFailure {
                        kind,
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            %kind,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            "Batch completed"
        );

        report
    }
}
