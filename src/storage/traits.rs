//! Collaborator contracts: where media bytes and marker documents live.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::marker::{MarkerId, MarkerRecord, MediaRef, NewMarkerRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item not found")]
    NotFound,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),
}

/// Blob store addressed by key.
///
/// A `put` under an existing key overwrites it, so callers must pick keys
/// that are unique per upload.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Durably store `bytes` under `key`.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Resolve a durable locator for bytes previously stored under `key`.
    async fn locator(&self, key: &str) -> Result<MediaRef, StoreError>;

    /// Read the bytes behind a locator.
    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, StoreError>;
}

/// Append-only marker document collection.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert one document, returning the id the store assigned to it.
    async fn insert(&self, record: &NewMarkerRecord) -> Result<MarkerId, StoreError>;

    /// List every document in the collection.
    async fn list_all(&self) -> Result<Vec<MarkerRecord>, StoreError>;
}
