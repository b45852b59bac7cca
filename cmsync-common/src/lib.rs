//! # cmsync Common Library
//!
//! Shared code for the cmsync services including:
//! - Error and result types
//! - Configuration loading (TOML + environment)
//! - SQLite bootstrap and the document store contract
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use db::{Document, DocumentStore, SetMode, StoredDocument};
pub use error::{Error, Result};
