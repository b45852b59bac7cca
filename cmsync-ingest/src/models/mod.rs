//! Entity model
//!
//! - [`kind`]: the closed set of entity kinds
//! - [`raw`]: payload shapes as delivered by the CMS
//! - [`records`]: canonical shapes persisted to the document store

pub mod kind;
pub mod raw;
pub mod records;

pub use kind::EntityKind;
pub use raw::RawEntity;
pub use records::{
    Address, Branding, CanonicalRecord, Geopoint, LocationBaseline, LocationRecord,
    PopularTimes, TenantRecord, TranslationRecord,
};
