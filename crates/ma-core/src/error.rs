//! # AppError
//!
//! Centralized error handling for the MyAccess ecosystem.
//! `StoreError` is what a document store backend reports; `AppError` is what
//! repository callers see.

use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::traits::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A create-with-id hit an existing document.
    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    /// The `expected_version` precondition of an update did not hold.
    #[error("document {collection}/{id} is at version {actual}, expected {expected}")]
    VersionMismatch {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// A field operation cannot be applied to the value currently stored at its path.
    #[error("cannot apply update to field '{path}': {reason}")]
    InvalidField { path: String, reason: String },

    /// Transport or driver failure (e.g., SQLite I/O, corrupt row).
    #[error("store backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

/// The primary error type for all repository operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found or not decodable (e.g., Place, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty place name, empty feature text)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A mutation was attempted without a resolved caller identity.
    #[error("unauthenticated: a signed-in user is required")]
    Unauthenticated,

    /// Optimistic writes kept losing against concurrent writers.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Opaque failure from the document store, not retried.
    #[error("store error: {0}")]
    StoreError(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => AppError::NotFound(collection, id),
            err @ StoreError::VersionMismatch { .. } => AppError::Conflict(err.to_string()),
            err => AppError::StoreError(err.to_string()),
        }
    }
}

/// A specialized Result type for MyAccess logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_keeps_identity() {
        let err: AppError = StoreError::NotFound { collection: "places".into(), id: "p1".into() }.into();
        assert!(matches!(err, AppError::NotFound(ref c, ref id) if c == "places" && id == "p1"));
    }

    #[test]
    fn version_mismatch_becomes_conflict() {
        let err: AppError = StoreError::VersionMismatch {
            collection: "places".into(),
            id: "p1".into(),
            expected: 3,
            actual: 4,
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn backend_failure_is_opaque() {
        let err: AppError = StoreError::Backend(anyhow::anyhow!("disk full")).into();
        match err {
            AppError::StoreError(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
