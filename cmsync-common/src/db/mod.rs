//! Document store contract and implementations
//!
//! Documents are JSON objects addressed by `(collection, id)`. Ids are always
//! supplied by the caller; the store never generates them.

pub mod init;
pub mod memory;
pub mod merge;
pub mod sqlite;

pub use init::init_database;
pub use memory::MemoryDocumentStore;
pub use merge::merge_patch;
pub use sqlite::SqliteDocumentStore;

use crate::Result;
use async_trait::async_trait;

/// A stored document body
pub type Document = serde_json::Map<String, serde_json::Value>;

/// How [`DocumentStore::set`] combines the new body with an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Overwrite the whole document
    Replace,
    /// Apply the body as a JSON merge patch (RFC 7396) over the existing
    /// document; creates the document if it is absent
    Merge,
}

/// A document together with the id it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Document,
}

/// Key-value document store, namespaced by collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Write one document
    async fn set(&self, collection: &str, id: &str, body: Document, mode: SetMode) -> Result<()>;

    /// Merge-patch an existing document, leaving absent ids absent
    ///
    /// Returns whether a document was updated. The existence check and the
    /// write are one atomic step, so a concurrent delete is never undone.
    async fn merge_existing(&self, collection: &str, id: &str, patch: Document) -> Result<bool>;

    /// Remove one document; removing an absent document is not an error
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Every document in a collection, ordered by id
    async fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }
}
