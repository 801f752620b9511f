//! Shared fixtures for the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ma_core::document::{Document, FieldUpdate, UpdateRequest};
use ma_core::error::StoreError;
use ma_core::models::{ImageFolder, NewPlace, RawImage, UserId};
use ma_core::traits::{DocumentStore, ImageUploader};
use ma_store_memory::MemoryStore;
use ma_store_sqlite::SqliteDocumentStore;
use tokio::sync::Barrier;

pub fn user(id: &str) -> UserId {
    UserId::from(id)
}

pub fn spence_hall() -> NewPlace {
    NewPlace {
        place_name: "Spence Hall".to_string(),
        description: "Freshman dorm".to_string(),
        location: "UD Campus".to_string(),
        city: "Newark".to_string(),
        ..Default::default()
    }
}

/// Both store backends, freshly created.
pub async fn backends() -> Vec<(&'static str, Arc<dyn DocumentStore>)> {
    let sqlite = SqliteDocumentStore::new("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");
    vec![
        ("memory", Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>),
        ("sqlite", Arc::new(sqlite) as Arc<dyn DocumentStore>),
    ]
}

/// Uploader that never touches disk; URLs encode folder and byte count.
pub struct RecordingUploader;

#[async_trait]
impl ImageUploader for RecordingUploader {
    async fn upload(&self, folder: ImageFolder, image: RawImage) -> anyhow::Result<String> {
        if image.data.is_empty() {
            anyhow::bail!("empty image");
        }
        Ok(format!("/static/uploads/{}/{}.jpg", folder.as_str(), image.data.len()))
    }
}

/// Wraps a store so the first `gated` reads all wait for each other before
/// returning. Two read-modify-write clients are thereby forced to read the
/// same snapshot before either writes.
pub struct GatedStore {
    inner: Arc<dyn DocumentStore>,
    barrier: Barrier,
    gated: usize,
    reads: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, gated: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(gated),
            gated,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let doc = self.inner.get(collection, id).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.gated {
            self.barrier.wait().await;
        }
        Ok(doc)
    }

    async fn create(&self, collection: &str, fields: Vec<FieldUpdate>) -> Result<String, StoreError> {
        self.inner.create(collection, fields).await
    }

    async fn create_with_id(&self, collection: &str, id: &str, fields: Vec<FieldUpdate>) -> Result<(), StoreError> {
        self.inner.create_with_id(collection, id, fields).await
    }

    async fn update_fields(&self, collection: &str, id: &str, request: UpdateRequest) -> Result<u64, StoreError> {
        self.inner.update_fields(collection, id, request).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection).await
    }
}
