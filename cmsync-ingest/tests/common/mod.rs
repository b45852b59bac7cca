//! Shared test doubles and fixtures for cmsync-ingest integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cmsync_common::config::SyncConfig;
use cmsync_common::db::MemoryDocumentStore;
use cmsync_common::{Document, DocumentStore};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use cmsync_ingest::clients::{
    AggregationEngine, AggregationError, CmsError, ContentSource, SanityImageResolver,
};
use cmsync_ingest::models::{EntityKind, PopularTimes};
use cmsync_ingest::{AppState, Collaborators};

/// Content source serving canned documents per kind
#[derive(Default)]
pub struct FakeContentSource {
    documents: HashMap<EntityKind, Vec<Value>>,
    failing: HashSet<EntityKind>,
}

impl FakeContentSource {
    pub fn with(mut self, kind: EntityKind, documents: Vec<Value>) -> Self {
        self.documents.insert(kind, documents);
        self
    }

    pub fn failing(mut self, kind: EntityKind) -> Self {
        self.failing.insert(kind);
        self
    }
}

#[async_trait]
impl ContentSource for FakeContentSource {
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Value>, CmsError> {
        if self.failing.contains(&kind) {
            return Err(CmsError::ApiError(503, "unavailable".to_string()));
        }
        Ok(self.documents.get(&kind).cloned().unwrap_or_default())
    }
}

/// Aggregation engine recording every call
///
/// Locations whose id is in `failing_ids` fail; all others get `result`.
pub struct FakeAggregation {
    result: PopularTimes,
    failing_ids: HashSet<String>,
    fail_all: bool,
    calls: Mutex<Vec<(String, bool)>>,
}

impl FakeAggregation {
    pub fn returning(result: Value) -> Self {
        Self {
            result: serde_json::from_value(result).expect("popular times fixture"),
            failing_ids: HashSet::new(),
            fail_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::returning(json!([]))
        }
    }

    pub fn failing_for(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    /// `(location id, force)` per call, in call order
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AggregationEngine for FakeAggregation {
    async fn compute(&self, location: &Document, force: bool) -> Result<PopularTimes, AggregationError> {
        let id = location
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.calls.lock().unwrap().push((id.clone(), force));

        if self.fail_all || self.failing_ids.contains(&id) {
            return Err(AggregationError::ApiError(500, format!("cannot aggregate {}", id)));
        }
        Ok(self.result.clone())
    }
}

pub struct Harness {
    pub store: Arc<MemoryDocumentStore>,
    pub aggregation: Arc<FakeAggregation>,
    pub state: AppState,
}

impl Harness {
    pub fn new(content: FakeContentSource, aggregation: FakeAggregation) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let aggregation = Arc::new(aggregation);

        let state = AppState::new(
            Collaborators {
                store: store.clone(),
                content: Arc::new(content),
                images: Arc::new(SanityImageResolver::new(
                    "https://cdn.sanity.io",
                    "proj",
                    "production",
                )),
                aggregation: aggregation.clone(),
            },
            &SyncConfig {
                max_concurrency: 4,
                stale_after_days: 6,
            },
        );

        Self {
            store,
            aggregation,
            state,
        }
    }

    pub fn simple() -> Self {
        Self::new(
            FakeContentSource::default(),
            FakeAggregation::returning(json!([{"day": "monday", "hours": [1, 2, 3]}])),
        )
    }

    pub async fn document(&self, kind: EntityKind, id: &str) -> Option<Document> {
        self.store.get(kind.collection(), id).await.unwrap()
    }

    pub async fn put(&self, kind: EntityKind, id: &str, body: Value) {
        let Value::Object(body) = body else {
            panic!("fixture must be an object");
        };
        self.store
            .set(kind.collection(), id, body, cmsync_common::SetMode::Replace)
            .await
            .unwrap();
    }
}

pub fn location_payload(id: &str, name: &str) -> Value {
    json!({
        "_id": id,
        "_type": "location",
        "name": name,
        "spaceId": "space-1",
        "assetId": "asset-1",
        "address": {
            "streetName": "Bahnhofplatz 1",
            "zipCode": "3011",
            "city": "Bern",
            "location": {"lat": 46.9489, "lng": 7.4378}
        },
        "image": {"asset": {"_ref": "image-abc123-800x600-jpg"}}
    })
}

pub fn tenant_payload(id: &str, locations: &[&str]) -> Value {
    let refs: Vec<Value> = locations.iter().map(|l| json!({"_ref": l})).collect();
    json!({
        "_id": id,
        "_type": "tenant",
        "_createdAt": "2023-03-01T08:00:00Z",
        "companyName": "Acme",
        "subdomain": {"current": "acme"},
        "locations": refs,
        "branding": {
            "productName": "Acme Spaces",
            "primaryColor": {"hex": "#112233"}
        }
    })
}

pub fn translation_payload(id: &str, key: &str) -> Value {
    json!({
        "_id": id,
        "_type": "translation",
        "key": {"current": key},
        "text": {"en": "Hello", "de": "Hallo"}
    })
}
