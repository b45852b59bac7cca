//! Synchronization core tests against the in-memory document store
//!
//! Covers create-vs-update semantics, the tenant cascade, reconciliation
//! batches and the popular-times refresh.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use cmsync_ingest::models::EntityKind;
use cmsync_ingest::services::{CascadeSummary, IngestOutcome, WriteDecision};
use cmsync_ingest::SyncError;

use common::{
    location_payload, tenant_payload, translation_payload, FakeAggregation, FakeContentSource,
    Harness,
};

fn synchronized(outcome: IngestOutcome) -> cmsync_ingest::services::SyncOutcome {
    match outcome {
        IngestOutcome::Synchronized(outcome) => outcome,
        other => panic!("expected synchronized outcome, got {:?}", other),
    }
}

// ============================================================================
// Create vs update
// ============================================================================

#[tokio::test]
async fn test_location_create_writes_baseline() {
    let harness = Harness::simple();

    let outcome = synchronized(
        harness
            .state
            .ingestion
            .create_or_update(location_payload("L1", "Main Hall"))
            .await
            .unwrap(),
    );
    assert_eq!(outcome.decision, WriteDecision::Create);
    assert_eq!(outcome.kind, EntityKind::Location);

    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(doc["id"], json!("L1"));
    assert_eq!(doc["title"], json!("Main Hall"));
    assert_eq!(doc["spaceId"], json!("space-1"));
    assert_eq!(doc["location"]["city"], json!("Bern"));
    assert_eq!(doc["location"]["geopoint"]["long"], json!(7.4378));
    assert_eq!(
        doc["imageUrl"],
        json!("https://cdn.sanity.io/images/proj/production/abc123-800x600.jpg?fm=webp")
    );
    assert_eq!(doc["absoluteOccupancy"], json!(0));
    assert_eq!(doc["relativeOccupancy"], json!(0));
    assert_eq!(doc["popularTimes"], json!([{"day": "monday", "hours": [1, 2, 3]}]));
    assert!(doc.contains_key("createdAt"));
    assert!(doc.contains_key("updatedAt"));

    assert_eq!(harness.aggregation.calls(), vec![("L1".to_string(), true)]);
}

#[tokio::test]
async fn test_location_update_keeps_creation_fields() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    let created = harness.document(EntityKind::Location, "L1").await.unwrap();

    let outcome = synchronized(
        ingestion
            .create_or_update(location_payload("L1", "Renamed Hall"))
            .await
            .unwrap(),
    );
    assert_eq!(outcome.decision, WriteDecision::Update);

    let updated = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(updated["title"], json!("Renamed Hall"));
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["popularTimes"], created["popularTimes"]);
    assert_eq!(updated["absoluteOccupancy"], json!(0));

    // Aggregation only runs on creation
    assert_eq!(harness.aggregation.calls().len(), 1);
}

#[tokio::test]
async fn test_update_merges_instead_of_replacing() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    harness
        .put(
            EntityKind::Location,
            "L1",
            json!({
                "id": "L1",
                "title": "Main Hall",
                "tenantId": "T9",
                "absoluteOccupancy": 42
            }),
        )
        .await;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();

    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(doc["tenantId"], json!("T9"));
    assert_eq!(doc["absoluteOccupancy"], json!(42));
    assert_eq!(doc["location"]["zipCode"], json!("3011"));
}

#[tokio::test]
async fn test_repeated_notification_is_idempotent() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(translation_payload("X1", "greeting"))
        .await
        .unwrap();
    let first = harness.document(EntityKind::Translation, "X1").await.unwrap();

    ingestion
        .create_or_update(translation_payload("X1", "greeting"))
        .await
        .unwrap();
    let second = harness.document(EntityKind::Translation, "X1").await.unwrap();

    assert_eq!(harness.store.count(EntityKind::Translation.collection()).await, 1);
    assert_eq!(first["createdAt"], second["createdAt"]);
    assert_eq!(second["key"], json!("greeting"));
    assert_eq!(second["text"], json!({"en": "Hello", "de": "Hallo"}));
}

#[tokio::test]
async fn test_aggregation_failure_does_not_block_create() {
    let harness = Harness::new(FakeContentSource::default(), FakeAggregation::always_failing());

    harness
        .state
        .ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();

    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(doc["popularTimes"], json!([]));
    assert_eq!(doc["title"], json!("Main Hall"));
}

#[tokio::test]
async fn test_tenant_created_at_comes_from_cms() {
    let harness = Harness::simple();

    harness
        .state
        .ingestion
        .create_or_update(tenant_payload("T1", &[]))
        .await
        .unwrap();

    let doc = harness.document(EntityKind::Tenant, "T1").await.unwrap();
    assert_eq!(doc["createdAt"], json!("2023-03-01T08:00:00Z"));
    assert_eq!(doc["companyName"], json!("Acme"));
    assert_eq!(doc["subdomain"], json!("acme"));
    assert_eq!(doc["branding"]["primaryColor"], json!("#112233"));
    assert_eq!(doc["locations"], json!([]));
}

#[tokio::test]
async fn test_unmirrored_type_is_ignored() {
    let harness = Harness::simple();

    let outcome = harness
        .state
        .ingestion
        .create_or_update(json!({"_id": "A1", "_type": "article"}))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        IngestOutcome::Ignored { type_tag: Some(ref t) } if t == "article"
    ));
    for kind in EntityKind::ALL {
        assert_eq!(harness.store.count(kind.collection()).await, 0);
    }
}

#[tokio::test]
async fn test_missing_id_is_rejected() {
    let harness = Harness::simple();

    let result = harness
        .state
        .ingestion
        .create_or_update(json!({"_type": "location", "name": "No id"}))
        .await;

    assert!(matches!(result, Err(SyncError::MissingId(EntityKind::Location))));
}

// ============================================================================
// Tenant cascade
// ============================================================================

#[tokio::test]
async fn test_tenant_cascades_onto_existing_locations_only() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();

    let outcome = synchronized(
        ingestion
            .create_or_update(tenant_payload("T1", &["L1", "L2"]))
            .await
            .unwrap(),
    );
    assert_eq!(
        outcome.cascade,
        Some(CascadeSummary {
            applied: 1,
            skipped: 1
        })
    );

    let l1 = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(l1["tenantId"], json!("T1"));
    assert_eq!(l1["title"], json!("Main Hall"));
    assert!(harness.document(EntityKind::Location, "L2").await.is_none());
}

#[tokio::test]
async fn test_cascade_is_idempotent() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();
    let first = harness.document(EntityKind::Location, "L1").await.unwrap();

    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();
    let second = harness.document(EntityKind::Location, "L1").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_location_created_after_tenant_gets_cascade_on_next_tenant_sync() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();
    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert!(!doc.contains_key("tenantId"));

    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();
    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(doc["tenantId"], json!("T1"));
}

#[tokio::test]
async fn test_removed_reference_keeps_stale_tenant_id() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();
    ingestion
        .create_or_update(tenant_payload("T1", &[]))
        .await
        .unwrap();

    let doc = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(doc["tenantId"], json!("T1"));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_only_the_named_document() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();

    let deleted = ingestion
        .delete(json!({"_id": "T1", "_type": "tenant"}))
        .await
        .unwrap();
    assert_eq!(deleted.kind, EntityKind::Tenant);
    assert_eq!(deleted.id, "T1");

    assert!(harness.document(EntityKind::Tenant, "T1").await.is_none());
    let l1 = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(l1["tenantId"], json!("T1"));
}

#[tokio::test]
async fn test_delete_unsupported_type() {
    let harness = Harness::simple();

    let result = harness
        .state
        .ingestion
        .delete(json!({"_id": "A1", "_type": "article"}))
        .await;

    assert!(matches!(
        result,
        Err(SyncError::UnsupportedKind(Some(ref t))) if t == "article"
    ));
}

#[tokio::test]
async fn test_delete_absent_document_succeeds() {
    let harness = Harness::simple();

    let result = harness
        .state
        .ingestion
        .delete(json!({"_id": "L404", "_type": "location"}))
        .await;

    assert!(result.is_ok());
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_reconciliation_synchronizes_every_kind() {
    let content = FakeContentSource::default()
        .with(
            EntityKind::Location,
            vec![location_payload("L1", "One"), location_payload("L2", "Two")],
        )
        .with(EntityKind::Tenant, vec![tenant_payload("T1", &[])])
        .with(
            EntityKind::Translation,
            vec![translation_payload("X1", "greeting")],
        );
    let harness = Harness::new(content, FakeAggregation::returning(json!([])));

    let report = harness.state.reconciler.reconcile_all().await;

    assert!(report.is_clean());
    assert_eq!(report.attempted, 4);
    assert_eq!(report.succeeded, 4);
    assert_eq!(harness.store.count("locations").await, 2);
    assert_eq!(harness.store.count("tenants").await, 1);
    assert_eq!(harness.store.count("translations").await, 1);
}

#[tokio::test]
async fn test_reconciliation_skips_and_reports_failures() {
    let content = FakeContentSource::default()
        .with(
            EntityKind::Location,
            vec![
                location_payload("L1", "One"),
                json!({"_type": "location", "name": "No id"}),
                location_payload("L3", "Three"),
            ],
        )
        .failing(EntityKind::Tenant)
        .with(
            EntityKind::Translation,
            vec![translation_payload("X1", "greeting")],
        );
    let harness = Harness::new(content, FakeAggregation::returning(json!([])));

    let report = harness.state.reconciler.reconcile_all().await;

    assert!(!report.is_clean());
    assert_eq!(report.attempted, 4);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed(), 2);
    assert!(report
        .failures
        .iter()
        .any(|f| f.kind == EntityKind::Tenant && f.id.is_none()));
    assert!(report
        .failures
        .iter()
        .any(|f| f.kind == EntityKind::Location && f.id.is_none()));

    assert!(harness.document(EntityKind::Location, "L1").await.is_some());
    assert!(harness.document(EntityKind::Location, "L3").await.is_some());
    assert!(harness.document(EntityKind::Translation, "X1").await.is_some());
}

#[tokio::test]
async fn test_reconciliation_twice_is_stable() {
    let content = FakeContentSource::default()
        .with(EntityKind::Translation, vec![translation_payload("X1", "greeting")]);
    let harness = Harness::new(content, FakeAggregation::returning(json!([])));

    harness.state.reconciler.reconcile_all().await;
    let first = harness.document(EntityKind::Translation, "X1").await.unwrap();
    harness.state.reconciler.reconcile_all().await;
    let second = harness.document(EntityKind::Translation, "X1").await.unwrap();

    assert_eq!(first["createdAt"], second["createdAt"]);
    assert_eq!(harness.store.count("translations").await, 1);
}

#[tokio::test]
async fn test_second_reconciliation_completes_tenant_cascade() {
    let content = FakeContentSource::default()
        .with(EntityKind::Location, vec![location_payload("L1", "One")])
        .with(EntityKind::Tenant, vec![tenant_payload("T1", &["L1"])]);
    let harness = Harness::new(content, FakeAggregation::returning(json!([])));

    let first = harness.state.reconciler.reconcile_all().await;
    assert!(first.is_clean());
    assert!(harness.document(EntityKind::Location, "L1").await.is_some());

    // Whether the first run already linked L1 depends on kind ordering
    let second = harness.state.reconciler.reconcile_all().await;
    assert!(second.is_clean());
    let l1 = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(l1["tenantId"], json!("T1"));
    assert_eq!(harness.store.count("locations").await, 1);
}

#[tokio::test]
async fn test_loosely_typed_payloads_are_mirrored() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    let mut location = location_payload("L1", "Main Hall");
    location["address"]["zipCode"] = json!(3011);
    ingestion.create_or_update(location).await.unwrap();

    let mut tenant = tenant_payload("T1", &["L1"]);
    tenant["locations"].as_array_mut().unwrap().push(json!(null));
    let outcome = synchronized(ingestion.create_or_update(tenant).await.unwrap());
    assert_eq!(
        outcome.cascade,
        Some(CascadeSummary {
            applied: 1,
            skipped: 0
        })
    );

    let l1 = harness.document(EntityKind::Location, "L1").await.unwrap();
    assert_eq!(l1["location"]["zipCode"], json!(3011));
    assert_eq!(l1["tenantId"], json!("T1"));
    let t1 = harness.document(EntityKind::Tenant, "T1").await.unwrap();
    assert_eq!(t1["locations"], json!(["L1"]));
}

#[tokio::test]
async fn test_tenant_cascade_does_not_recreate_deleted_location() {
    let harness = Harness::simple();
    let ingestion = &harness.state.ingestion;

    ingestion
        .create_or_update(location_payload("L1", "Main Hall"))
        .await
        .unwrap();
    ingestion
        .delete(json!({"_id": "L1", "_type": "location"}))
        .await
        .unwrap();
    ingestion
        .create_or_update(tenant_payload("T1", &["L1"]))
        .await
        .unwrap();

    assert!(harness.document(EntityKind::Location, "L1").await.is_none());
}

// ============================================================================
// Popular-times refresh
// ============================================================================

async fn seed_locations(harness: &Harness) {
    let now = Utc::now();
    harness
        .put(
            EntityKind::Location,
            "old",
            json!({"id": "old", "title": "Old", "updatedAt": (now - Duration::days(10)).to_rfc3339()}),
        )
        .await;
    harness
        .put(
            EntityKind::Location,
            "fresh",
            json!({"id": "fresh", "title": "Fresh", "updatedAt": (now - Duration::days(1)).to_rfc3339()}),
        )
        .await;
    harness
        .put(
            EntityKind::Location,
            "undated",
            json!({"id": "undated", "title": "Undated"}),
        )
        .await;
}

#[tokio::test]
async fn test_refresh_selects_only_stale_locations() {
    let harness = Harness::new(
        FakeContentSource::default(),
        FakeAggregation::returning(json!([{"day": "tuesday"}])),
    );
    seed_locations(&harness).await;

    let summary = harness.state.scheduler.refresh_stale(false).await.unwrap();

    assert_eq!(summary.dispatched, 1);
    assert!(summary.report.is_clean());
    assert_eq!(harness.aggregation.calls(), vec![("old".to_string(), false)]);

    let old = harness.document(EntityKind::Location, "old").await.unwrap();
    assert_eq!(old["popularTimes"], json!([{"day": "tuesday"}]));
    assert_eq!(old["title"], json!("Old"));
    let refreshed_at = cmsync_common::time::parse_timestamp(old["updatedAt"].as_str().unwrap()).unwrap();
    assert!(Utc::now() - refreshed_at < Duration::minutes(1));

    let fresh = harness.document(EntityKind::Location, "fresh").await.unwrap();
    assert!(!fresh.contains_key("popularTimes"));
}

#[tokio::test]
async fn test_forced_refresh_selects_every_location() {
    let harness = Harness::simple();
    seed_locations(&harness).await;

    let summary = harness.state.scheduler.refresh_stale(true).await.unwrap();

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.report.succeeded, 3);
    let mut ids: Vec<String> = harness
        .aggregation
        .calls()
        .into_iter()
        .map(|(id, force)| {
            assert!(!force);
            id
        })
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["fresh", "old", "undated"]);
}

#[tokio::test]
async fn test_refresh_failure_leaves_location_untouched() {
    let harness = Harness::new(
        FakeContentSource::default(),
        FakeAggregation::returning(json!([{"day": "friday"}])).failing_for("fresh"),
    );
    seed_locations(&harness).await;
    let before = harness.document(EntityKind::Location, "fresh").await.unwrap();

    let summary = harness.state.scheduler.refresh_stale(true).await.unwrap();

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.report.failed(), 1);
    assert_eq!(summary.report.failures[0].id.as_deref(), Some("fresh"));
    assert_eq!(
        harness.document(EntityKind::Location, "fresh").await.unwrap(),
        before
    );
    let old = harness.document(EntityKind::Location, "old").await.unwrap();
    assert_eq!(old["popularTimes"], json!([{"day": "friday"}]));
}

#[tokio::test]
async fn test_refresh_with_no_locations() {
    let harness = Harness::simple();

    let summary = harness.state.scheduler.refresh_stale(false).await.unwrap();

    assert_eq!(summary.dispatched, 0);
    assert!(summary.report.is_clean());
    assert!(harness.aggregation.calls().is_empty());
}
