//! Entity kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of content mirrored from the CMS
///
/// Each kind owns one document collection. Adding a variant forces every
/// `match` on it (mapper, synchronizer, delete routing) to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Location,
    Tenant,
    Translation,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Location,
        EntityKind::Tenant,
        EntityKind::Translation,
    ];

    /// The CMS `_type` tag for this kind
    pub fn type_tag(self) -> &'static str {
        match self {
            EntityKind::Location => "location",
            EntityKind::Tenant => "tenant",
            EntityKind::Translation => "translation",
        }
    }

    /// Document collection holding this kind
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Location => "locations",
            EntityKind::Tenant => "tenants",
            EntityKind::Translation => "translations",
        }
    }

    /// Look up a kind by its CMS `_type` tag
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_tag() == tag)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}
