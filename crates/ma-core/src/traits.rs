//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::document::{Document, FieldUpdate, UpdateRequest};
use crate::error::StoreError;
use crate::models::{ImageFolder, RawImage, UserId};

/// Document persistence contract.
///
/// Implementations must apply each [`UpdateRequest`] atomically and serialize
/// concurrent requests against the same document. Nothing is promised across
/// separate calls (e.g., a `get` followed by an `update_fields`).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a whole document. `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Inserts a new document under a store-assigned id and returns that id.
    async fn create(&self, collection: &str, fields: Vec<FieldUpdate>) -> Result<String, StoreError>;

    /// Inserts a new document under `id`; `AlreadyExists` if one is there.
    async fn create_with_id(&self, collection: &str, id: &str, fields: Vec<FieldUpdate>) -> Result<(), StoreError>;

    /// Applies a field-level update and returns the document's new version.
    async fn update_fields(&self, collection: &str, id: &str, request: UpdateRequest) -> Result<u64, StoreError>;

    /// Every document in the collection, unordered.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// Image upload contract. Returns the public URL of the stored image.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, folder: ImageFolder, image: RawImage) -> anyhow::Result<String>;
}

/// Identity contract: turns an opaque bearer credential into a user id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Mints a credential for `user`. Normally done by the identity provider.
    fn issue_token(&self, user: &UserId) -> String;

    /// The user a credential belongs to, or `None` when it is invalid.
    fn resolve_token(&self, token: &str) -> Option<UserId>;
}
