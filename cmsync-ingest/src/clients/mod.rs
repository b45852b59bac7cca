//! External collaborators
//!
//! Each collaborator sits behind a trait so the core can be wired with real
//! HTTP clients in production and with test doubles in tests.

pub mod aggregation;
pub mod cms;
pub mod images;

pub use aggregation::{AggregationEngine, AggregationError, DisabledAggregationEngine, HttpAggregationEngine};
pub use cms::{CmsError, ContentSource, SanityContentClient};
pub use images::{ImageFormat, ImageUrlResolver, SanityImageResolver};
