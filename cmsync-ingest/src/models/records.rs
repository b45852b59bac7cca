//! Canonical persisted shapes
//!
//! Records never serialize `None` fields. Updates are merge writes, so a field
//! the CMS did not send leaves the stored value untouched.

use chrono::{DateTime, Utc};
use cmsync_common::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntityKind;

/// Derived occupancy pattern data, opaque to this service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopularTimes(pub Vec<Value>);

impl PopularTimes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geopoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_link: Option<Value>,
    pub geopoint: Geopoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<Value>,
    #[serde(rename = "location")]
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a location receives exactly once, when it is first persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBaseline {
    pub created_at: DateTime<Utc>,
    pub absolute_occupancy: i64,
    pub relative_occupancy: i64,
    pub popular_times: PopularTimes,
}

impl LocationBaseline {
    pub fn new(created_at: DateTime<Utc>, popular_times: PopularTimes) -> Self {
        Self {
            created_at,
            absolute_occupancy: 0,
            relative_occupancy: 0,
            popular_times,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_background_color: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub id: String,
    /// CMS creation time; written as `createdAt` on creation only
    #[serde(skip)]
    pub source_created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<Value>,
    /// Ids of the locations this tenant owns, in CMS order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<Value>,
    pub branding: Branding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: String,
    /// CMS creation time; written as `createdAt` on creation only
    #[serde(skip)]
    pub source_created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
}

/// A mapped record of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    Location(LocationRecord),
    Tenant(TenantRecord),
    Translation(TranslationRecord),
}

impl CanonicalRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonicalRecord::Location(_) => EntityKind::Location,
            CanonicalRecord::Tenant(_) => EntityKind::Tenant,
            CanonicalRecord::Translation(_) => EntityKind::Translation,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CanonicalRecord::Location(record) => &record.id,
            CanonicalRecord::Tenant(record) => &record.id,
            CanonicalRecord::Translation(record) => &record.id,
        }
    }

    /// The document body written on every synchronization
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match self {
            CanonicalRecord::Location(record) => to_document(record),
            CanonicalRecord::Tenant(record) => to_document(record),
            CanonicalRecord::Translation(record) => to_document(record),
        }
    }
}

/// Serialize any record into a document body
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "record serialized to non-object {}",
            other
        ))),
    }
}
