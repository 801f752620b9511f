//! # ma-store-sqlite
//!
//! SQLite implementation of `DocumentStore`. Each document is one row holding
//! its JSON body and a version counter; field updates are applied with a
//! compare-and-swap on that counter, so concurrent writers never overwrite
//! each other's changes.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use ma_core::document::{Document, FieldUpdate, UpdateRequest};
use ma_core::error::StoreError;
use ma_core::traits::DocumentStore;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    version INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Connects to `url` (e.g. `sqlite:myaccess.db` or `sqlite::memory:`),
    /// creating the database file and schema when missing.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool_options = if url.contains(":memory:") {
            // Every connection would otherwise get its own empty database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        info!("SQLite document store ready at {url}");
        Ok(Self { pool })
    }

    /// Stores `fields` verbatim at version 1, bypassing field operations.
    pub async fn insert_raw(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO documents (collection, id, version, body) VALUES (?, ?, 1, ?)")
            .bind(collection)
            .bind(id)
            .bind(fields.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| insert_error(err, collection, id))?;
        Ok(())
    }
}

fn backend(err: impl Into<anyhow::Error>) -> StoreError {
    StoreError::Backend(err.into())
}

fn insert_error(err: sqlx::Error, collection: &str, id: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            };
        }
    }
    backend(err)
}

/// Reads a body into a field map. A non-object body is wrapped under
/// `value` and an unparseable one reads as empty, so one bad row never
/// fails a whole listing; decoding the document is left to the caller.
fn body_fields(id: &str, body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("Document {id} has a non-object body; wrapping it");
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
        Err(err) => {
            warn!("Document {id} has an unparseable body: {err}");
            Map::new()
        }
    }
}

fn row_to_document(row: &SqliteRow) -> Result<Document, StoreError> {
    let id: String = row.try_get("id").map_err(backend)?;
    let version: i64 = row.try_get("version").map_err(backend)?;
    let body: String = row.try_get("body").map_err(backend)?;
    Ok(Document {
        fields: body_fields(&id, &body),
        version: u64::try_from(version).map_err(backend)?,
        id,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, version, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn create(&self, collection: &str, fields: Vec<FieldUpdate>) -> Result<String, StoreError> {
        let id = Uuid::now_v7().to_string();
        self.create_with_id(collection, &id, fields).await?;
        Ok(id)
    }

    async fn create_with_id(&self, collection: &str, id: &str, fields: Vec<FieldUpdate>) -> Result<(), StoreError> {
        let doc = Document::create(id, &fields, Utc::now())?;
        let body = Value::Object(doc.fields).to_string();
        sqlx::query("INSERT INTO documents (collection, id, version, body) VALUES (?, ?, ?, ?)")
            .bind(collection)
            .bind(id)
            .bind(doc.version as i64)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|err| insert_error(err, collection, id))?;
        debug!("Created {collection}/{id}");
        Ok(())
    }

    async fn update_fields(&self, collection: &str, id: &str, request: UpdateRequest) -> Result<u64, StoreError> {
        loop {
            let mut doc = self.get(collection, id).await?.ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

            if let Some(expected) = request.expected_version {
                if doc.version != expected {
                    return Err(StoreError::VersionMismatch {
                        collection: collection.to_string(),
                        id: id.to_string(),
                        expected,
                        actual: doc.version,
                    });
                }
            }

            let read_version = doc.version;
            doc.apply(&request.updates, Utc::now())?;

            let swapped = sqlx::query(
                "UPDATE documents SET version = ?, body = ? WHERE collection = ? AND id = ? AND version = ?",
            )
            .bind(doc.version as i64)
            .bind(Value::Object(doc.fields).to_string())
            .bind(collection)
            .bind(id)
            .bind(read_version as i64)
            .execute(&self.pool)
            .await
            .map_err(backend)?
            .rows_affected();

            if swapped == 1 {
                return Ok(doc.version);
            }
            // Lost the race; a conditional request re-reads and reports the
            // mismatch, an unconditional one simply reapplies.
            debug!("Concurrent write on {collection}/{id}, retrying");
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        sqlx::query("SELECT id, version, body FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(row_to_document)
            .collect()
    }
}
