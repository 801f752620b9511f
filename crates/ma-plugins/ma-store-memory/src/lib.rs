//! # ma-store-memory
//!
//! In-process implementation of `DocumentStore`.
//! Each update request runs under the document's map-shard lock, so requests
//! against one document are serialized and applied all-or-nothing.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use ma_core::document::{Document, FieldUpdate, UpdateRequest};
use ma_core::error::StoreError;
use ma_core::traits::DocumentStore;
use serde_json::Value;
use uuid::Uuid;

type DocKey = (String, String);

#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<DocKey, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `fields` verbatim, bypassing field operations. Used to seed
    /// legacy or malformed documents.
    pub fn insert_raw(&self, collection: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.docs.insert(
            key(collection, id),
            Document { id: id.to_string(), version: 1, fields },
        );
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn key(collection: &str, id: &str) -> DocKey {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.get(&key(collection, id)).map(|doc| doc.clone()))
    }

    async fn create(&self, collection: &str, fields: Vec<FieldUpdate>) -> Result<String, StoreError> {
        let id = Uuid::now_v7().to_string();
        self.create_with_id(collection, &id, fields).await?;
        Ok(id)
    }

    async fn create_with_id(&self, collection: &str, id: &str, fields: Vec<FieldUpdate>) -> Result<(), StoreError> {
        match self.docs.entry(key(collection, id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Document::create(id, &fields, Utc::now())?);
                debug!("Created {collection}/{id}");
                Ok(())
            }
        }
    }

    async fn update_fields(&self, collection: &str, id: &str, request: UpdateRequest) -> Result<u64, StoreError> {
        let mut doc = self
            .docs
            .get_mut(&key(collection, id))
            .ok_or_else(|| StoreError::NotFound {
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

        doc.apply(&request.updates, Utc::now())?;
        Ok(doc.version)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
