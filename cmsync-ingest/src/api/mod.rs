//! HTTP API handlers for cmsync-ingest

pub mod health;
pub mod notifications;
pub mod popular_times;
pub mod reconciliation;

pub use health::health_routes;
pub use notifications::notification_routes;
pub use popular_times::popular_times_routes;
pub use reconciliation::reconciliation_routes;
