//! CMS payload shapes
//!
//! Decoding never rejects a payload over one field. Display and foreign-key
//! values are kept as raw JSON and passed through unchanged, whatever their
//! type. Structured fields (address, branding, slugs, references, creation
//! timestamp) that do not have the expected shape decode as absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::EntityKind;

/// Decode a field as `T`, mapping `null` or any other shape to `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Decode a list element by element; elements of the wrong shape become `None`
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<Option<T>>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items: Option<Vec<Value>> = lenient(deserializer)?;
    Ok(items.map(|items| {
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).ok())
            .collect()
    }))
}

/// Reference to another CMS document (`{"_ref": "..."}`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawReference {
    #[serde(rename = "_ref", deserialize_with = "lenient")]
    pub reference: Option<String>,
}

/// Slug field (`{"current": "..."}`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSlug {
    pub current: Option<Value>,
}

/// Color picker value; only the hex form is mirrored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawColor {
    pub hex: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGeopoint {
    pub lat: Option<Value>,
    pub lng: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAddress {
    pub street_name: Option<Value>,
    pub zip_code: Option<Value>,
    pub city: Option<Value>,
    pub maps_link: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<RawGeopoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(rename = "_id", deserialize_with = "lenient")]
    pub id: Option<String>,
    pub name: Option<Value>,
    /// Plain or rich text
    pub description: Option<Value>,
    pub space_id: Option<Value>,
    pub asset_id: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub address: Option<RawAddress>,
    /// Opaque image reference, resolved to a URL by the mapper
    pub image: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawBranding {
    pub logo: Option<Value>,
    pub product_name: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub primary_color: Option<RawColor>,
    #[serde(deserialize_with = "lenient")]
    pub secondary_color: Option<RawColor>,
    #[serde(deserialize_with = "lenient")]
    pub header_background_color: Option<RawColor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTenant {
    #[serde(rename = "_id", deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(rename = "_createdAt", deserialize_with = "lenient")]
    pub created_at: Option<String>,
    pub company_name: Option<Value>,
    /// `null` or malformed entries are kept as `None` and skipped by the mapper
    #[serde(deserialize_with = "lenient_list")]
    pub locations: Option<Vec<Option<RawReference>>>,
    #[serde(deserialize_with = "lenient")]
    pub subdomain: Option<RawSlug>,
    #[serde(deserialize_with = "lenient")]
    pub branding: Option<RawBranding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTranslation {
    #[serde(rename = "_id", deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(rename = "_createdAt", deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub key: Option<RawSlug>,
    pub text: Option<Value>,
}

/// A decoded CMS payload, tagged by kind
#[derive(Debug, Clone)]
pub enum RawEntity {
    Location(RawLocation),
    Tenant(RawTenant),
    Translation(RawTranslation),
}

impl RawEntity {
    /// Decode a payload whose kind is already known
    pub fn from_value(kind: EntityKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Location => RawEntity::Location(serde_json::from_value(value)?),
            EntityKind::Tenant => RawEntity::Tenant(serde_json::from_value(value)?),
            EntityKind::Translation => RawEntity::Translation(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            RawEntity::Location(_) => EntityKind::Location,
            RawEntity::Tenant(_) => EntityKind::Tenant,
            RawEntity::Translation(_) => EntityKind::Translation,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            RawEntity::Location(raw) => raw.id.as_deref(),
            RawEntity::Tenant(raw) => raw.id.as_deref(),
            RawEntity::Translation(raw) => raw.id.as_deref(),
        }
    }
}

/// Read the `_type` tag of a payload, if it names a known kind
pub fn kind_of(payload: &Value) -> Option<EntityKind> {
    payload
        .get("_type")
        .and_then(Value::as_str)
        .and_then(EntityKind::from_type_tag)
}

/// Read the `_id` of a payload
pub fn id_of(payload: &Value) -> Option<&str> {
    payload.get("_id").and_then(Value::as_str)
}
