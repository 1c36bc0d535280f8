//! In-process store implementations for tests, demos and offline use.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::marker::{MarkerId, MarkerRecord, MediaRef, NewMarkerRecord};
use super::traits::{MediaStore, MetadataStore, StoreError};

const LOCATOR_SCHEME: &str = "mem://";

pub struct InMemoryMediaStore {
    bucket: String,
    blobs: DashMap<String, Vec<u8>>,
}

impl InMemoryMediaStore {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            blobs: DashMap::new(),
        }
    }

    /// Get current blob count
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    fn key_for<'a>(&self, media: &'a MediaRef) -> Option<&'a str> {
        media
            .as_str()
            .strip_prefix(LOCATOR_SCHEME)?
            .strip_prefix(self.bucket.as_str())?
            .strip_prefix('/')
    }
}

impl Default for InMemoryMediaStore {
    fn default() -> Self {
        Self::new("media")
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn locator(&self, key: &str) -> Result<MediaRef, StoreError> {
        if !self.blobs.contains_key(key) {
            return Err(StoreError::NotFound);
        }
        Ok(MediaRef::from_store(format!("{}{}/{}", LOCATOR_SCHEME, self.bucket, key)))
    }

    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, StoreError> {
        let key = self.key_for(media).ok_or(StoreError::NotFound)?;
        self.blobs
            .get(key)
            .map(|blob| blob.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

/// Append-only document list with store-assigned ids.
pub struct InMemoryMetadataStore {
    records: RwLock<Vec<MarkerRecord>>,
}

impl InMemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Append a pre-built record as-is, bypassing id assignment.
    ///
    /// Lets tests reproduce listings a real backend could return
    /// (duplicate ids, out-of-range coordinates).
    pub fn seed(&self, record: MarkerRecord) {
        self.records.write().push(record);
    }

    /// Get current document count
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert(&self, record: &NewMarkerRecord) -> Result<MarkerId, StoreError> {
        let id = MarkerId::new(Uuid::new_v4().simple().to_string());
        self.records.write().push(MarkerRecord {
            id: id.clone(),
            latitude: record.coordinate.latitude(),
            longitude: record.coordinate.longitude(),
            media: record.media.clone(),
            created_at: record.created_at,
        });
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<MarkerRecord>, StoreError> {
        Ok(self.records.read().clone())
    }
}
