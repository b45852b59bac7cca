//! SQLite-backed document store
//!
//! All documents live in one `documents` table keyed by `(collection, id)`.
//! Merge writes run as a single upsert using SQLite's `json_patch`, so two
//! concurrent merges on the same id resolve inside the database.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use super::{init, Document, DocumentStore, SetMode, StoredDocument};
use crate::{Error, Result};

/// Document store over a SQLite pool
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Wrap an existing pool; the schema must already exist
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database file, creating file and schema if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode_body(collection: &str, id: &str, raw: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: format!("expected JSON object, found {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(decode_body(collection, id, &body)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, collection: &str, id: &str, body: Document, mode: SetMode) -> Result<()> {
        let body = serde_json::to_string(&Value::Object(body))?;
        let written_at = crate::time::now().to_rfc3339();

        let statement = match mode {
            SetMode::Replace => {
                r#"
                INSERT INTO documents (collection, id, body, written_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    body = excluded.body,
                    written_at = excluded.written_at
                "#
            }
            SetMode::Merge => {
                r#"
                INSERT INTO documents (collection, id, body, written_at)
                VALUES (?, ?, json_patch('{}', ?), ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    body = json_patch(documents.body, excluded.body),
                    written_at = excluded.written_at
                "#
            }
        };

        sqlx::query(statement)
            .bind(collection)
            .bind(id)
            .bind(&body)
            .bind(&written_at)
            .execute(&self.pool)
            .await?;

        tracing::trace!(collection, id, ?mode, "Document written");
        Ok(())
    }

    async fn merge_existing(&self, collection: &str, id: &str, patch: Document) -> Result<bool> {
        let patch = serde_json::to_string(&Value::Object(patch))?;
        let written_at = crate::time::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = json_patch(body, ?), written_at = ?
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(&patch)
        .bind(&written_at)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                let body = decode_body(collection, &id, &body)?;
                Ok(StoredDocument { id, body })
            })
            .collect()
    }
}
