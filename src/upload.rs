// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upload coordinator: the "new marker" transaction.
//!
//! One submission is a strictly ordered chain, each step a single
//! collaborator call:
//!
//! ```text
//! validate ─► derive key ─► put bytes ─► resolve locator ─► insert record ─► append to cache
//!   (local)     (local)      MediaStore     MediaStore        MetadataStore     MarkerCache
//! ```
//!
//! The first failing step ends the submission with its own [`UploadError`]
//! variant. Nothing reaches the cache unless every step before the append
//! succeeded. Bytes stored by a submission that later fails stay in the
//! media store; no compensating delete is attempted. No step is retried.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::MarkerCache;
use crate::config::SyncSessionConfig;
use crate::error::UploadError;
use crate::marker::{Coordinate, Marker, MarkerId, MediaRef, NewMarkerRecord};
use crate::metrics::StageTimer;
use crate::storage::bounded;
use crate::storage::traits::{MediaStore, MetadataStore, StoreError};

const MAX_EXTENSION_LEN: usize = 8;

/// Build a fresh media key under `prefix`.
///
/// The unique part is a time-ordered UUIDv7, so two uploads never share a
/// key. A caller-supplied file name only contributes its extension.
#[must_use]
pub fn derive_storage_key(prefix: &str, file_name: Option<&str>) -> String {
    let id = Uuid::now_v7();
    let prefix = prefix.trim_end_matches('/');
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase());

    match (prefix.is_empty(), extension) {
        (true, None) => id.to_string(),
        (true, Some(ext)) => format!("{}.{}", id, ext),
        (false, None) => format!("{}/{}", prefix, id),
        (false, Some(ext)) => format!("{}/{}.{}", prefix, id, ext),
    }
}

pub struct UploadCoordinator {
    media: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataStore>,
    cache: Arc<MarkerCache>,
    media_prefix: String,
    max_media_bytes: usize,
    store_timeout: Duration,
}

impl UploadCoordinator {
    pub fn new(
        config: &SyncSessionConfig,
        media: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        cache: Arc<MarkerCache>,
    ) -> Self {
        Self {
            media,
            metadata,
            cache,
            media_prefix: config.media_prefix.clone(),
            max_media_bytes: config.max_media_bytes,
            store_timeout: config.store_timeout(),
        }
    }

    /// Submit a new marker at `(latitude, longitude)` carrying `bytes`.
    pub async fn submit_marker(
        &self,
        point: (f64, f64),
        bytes: &[u8],
    ) -> Result<Marker, UploadError> {
        self.submit_marker_named(point, bytes, None).await
    }

    /// Like [`submit_marker`](Self::submit_marker), keeping the extension of
    /// the picked file's name on the storage key.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn submit_marker_named(
        &self,
        point: (f64, f64),
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Marker, UploadError> {
        let result = self.run_pipeline(point, bytes, file_name).await;
        match &result {
            Ok(marker) => {
                crate::metrics::record_submission("append", "success");
                crate::metrics::record_media_bytes(bytes.len());
                info!(id = %marker.id, coordinate = %marker.coordinate, "Marker submitted");
            }
            Err(e) => {
                crate::metrics::record_submission(e.stage(), "error");
                warn!(stage = e.stage(), error = %e, "Marker submission failed");
            }
        }
        result
    }

    async fn run_pipeline(
        &self,
        point: (f64, f64),
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Marker, UploadError> {
        let coordinate = self.validate(point, bytes)?;
        let key = derive_storage_key(&self.media_prefix, file_name);

        self.store_media(&key, bytes).await?;
        let media = self.resolve_locator(&key).await?;

        let record = NewMarkerRecord::new(coordinate, media);
        let id = self.persist(&record).await?;

        let marker = Marker::from_record(id, record);
        self.commit(marker.clone())?;
        Ok(marker)
    }

    /// Step 1: local checks. Nothing has been sent anywhere if this fails.
    pub fn validate(
        &self,
        (latitude, longitude): (f64, f64),
        bytes: &[u8],
    ) -> Result<Coordinate, UploadError> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        if bytes.is_empty() {
            return Err(UploadError::EmptyMedia);
        }
        if bytes.len() > self.max_media_bytes {
            return Err(UploadError::MediaTooLarge {
                size: bytes.len(),
                limit: self.max_media_bytes,
            });
        }
        Ok(coordinate)
    }

    /// Step 3: write the bytes.
    pub async fn store_media(&self, key: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let _timer = StageTimer::new("put");
        debug!(key, size = bytes.len(), "Uploading media");
        bounded(self.store_timeout, self.media.put(key, bytes))
            .await
            .map_err(|e| UploadError::UploadFailed(self.note_timeout("put", e)))
    }

    /// Step 4: turn the key into a durable locator.
    pub async fn resolve_locator(&self, key: &str) -> Result<MediaRef, UploadError> {
        let _timer = StageTimer::new("locator");
        debug!(key, "Resolving media locator");
        bounded(self.store_timeout, self.media.locator(key))
            .await
            .map_err(|e| UploadError::LocatorUnavailable(self.note_timeout("locator", e)))
    }

    /// Step 5: insert the marker document.
    pub async fn persist(&self, record: &NewMarkerRecord) -> Result<MarkerId, UploadError> {
        let _timer = StageTimer::new("insert");
        debug!(media = %record.media, "Inserting marker record");
        bounded(self.store_timeout, self.metadata.insert(record))
            .await
            .map_err(|e| UploadError::PersistFailed(self.note_timeout("insert", e)))
    }

    /// Step 6: make the marker visible locally.
    pub fn commit(&self, marker: Marker) -> Result<(), UploadError> {
        self.cache.append(marker).map_err(UploadError::from)
    }

    fn note_timeout(&self, stage: &str, err: StoreError) -> StoreError {
        if matches!(err, StoreError::Timeout(_)) {
            crate::metrics::record_timeout(stage);
        }
        err
    }
}
