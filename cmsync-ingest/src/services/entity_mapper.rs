//! Entity mapper: CMS payload → canonical record
//!
//! Pure transform apart from image URL derivation, which is itself a pure
//! string computation. `updatedAt` comes from the caller-supplied `now`;
//! `createdAt`, occupancy counters and popular times are owned by the
//! synchronizer and never set here.

use chrono::{DateTime, Utc};
use cmsync_common::time::parse_timestamp;
use serde_json::Value;
use std::sync::Arc;

use crate::clients::{ImageFormat, ImageUrlResolver};
use crate::error::SyncError;
use crate::models::raw::{RawColor, RawLocation, RawTenant, RawTranslation};
use crate::models::{
    Address, Branding, CanonicalRecord, EntityKind, Geopoint, LocationRecord, RawEntity,
    TenantRecord, TranslationRecord,
};

pub struct EntityMapper {
    images: Arc<dyn ImageUrlResolver>,
}

impl EntityMapper {
    pub fn new(images: Arc<dyn ImageUrlResolver>) -> Self {
        Self { images }
    }

    /// Decode a raw payload of a known kind and map it
    pub fn map_payload(
        &self,
        kind: EntityKind,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Result<CanonicalRecord, SyncError> {
        let raw = RawEntity::from_value(kind, payload)
            .map_err(|source| SyncError::Payload { kind, source })?;
        self.map(raw, now)
    }

    pub fn map(&self, raw: RawEntity, now: DateTime<Utc>) -> Result<CanonicalRecord, SyncError> {
        Ok(match raw {
            RawEntity::Location(raw) => CanonicalRecord::Location(self.map_location(raw, now)?),
            RawEntity::Tenant(raw) => CanonicalRecord::Tenant(self.map_tenant(raw, now)?),
            RawEntity::Translation(raw) => {
                CanonicalRecord::Translation(map_translation(raw, now)?)
            }
        })
    }

    fn map_location(&self, raw: RawLocation, now: DateTime<Utc>) -> Result<LocationRecord, SyncError> {
        let id = require_id(EntityKind::Location, raw.id)?;

        let image_url = raw
            .image
            .as_ref()
            .and_then(|image| self.images.resolve(image, Some(ImageFormat::Webp)));

        let raw_address = raw.address.unwrap_or_default();
        let raw_geopoint = raw_address.location.unwrap_or_default();

        Ok(LocationRecord {
            id,
            title: raw.name,
            description: raw.description,
            space_id: raw.space_id,
            asset_id: raw.asset_id,
            address: Address {
                street_name: raw_address.street_name,
                zip_code: raw_address.zip_code,
                city: raw_address.city,
                maps_link: raw_address.maps_link,
                geopoint: Geopoint {
                    lat: raw_geopoint.lat,
                    long: raw_geopoint.lng,
                },
            },
            image_url,
            updated_at: now,
        })
    }

    fn map_tenant(&self, raw: RawTenant, now: DateTime<Utc>) -> Result<TenantRecord, SyncError> {
        let id = require_id(EntityKind::Tenant, raw.id)?;
        let branding = raw.branding.unwrap_or_default();

        let logo_url = branding
            .logo
            .as_ref()
            .and_then(|logo| self.images.resolve(logo, None));

        let locations = raw.locations.map(|references| {
            references
                .into_iter()
                .flatten()
                .filter_map(|reference| reference.reference)
                .collect()
        });

        Ok(TenantRecord {
            source_created_at: cms_created_at(&id, raw.created_at.as_deref()),
            id,
            updated_at: now,
            company_name: raw.company_name,
            locations,
            subdomain: raw.subdomain.and_then(|slug| slug.current),
            branding: Branding {
                logo_url,
                product_name: branding.product_name,
                primary_color: hex(branding.primary_color),
                secondary_color: hex(branding.secondary_color),
                header_background_color: hex(branding.header_background_color),
            },
        })
    }
}

fn map_translation(raw: RawTranslation, now: DateTime<Utc>) -> Result<TranslationRecord, SyncError> {
    let id = require_id(EntityKind::Translation, raw.id)?;

    Ok(TranslationRecord {
        source_created_at: cms_created_at(&id, raw.created_at.as_deref()),
        id,
        updated_at: now,
        key: raw.key.and_then(|slug| slug.current),
        text: raw.text,
    })
}

fn require_id(kind: EntityKind, id: Option<String>) -> Result<String, SyncError> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or(SyncError::MissingId(kind))
}

fn hex(color: Option<RawColor>) -> Option<Value> {
    color.and_then(|color| color.hex)
}

fn cms_created_at(id: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        tracing::debug!(id, value, "Unparseable CMS creation timestamp ignored");
    }
    parsed
}
