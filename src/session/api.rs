// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Session API used by the renderer and the picker handoff.
//!
//! - `submit()` / `submit_named()` - New marker through the upload pipeline
//! - `submit_picked()` - Picker result handoff (cancel/deny short-circuit)
//! - `snapshot()` - Frozen marker view for drawing
//! - `marker()` / `media_bytes()` - Marker selection

use std::sync::Arc;

use tracing::{debug, error, Instrument};

use crate::cache::MarkerSnapshot;
use crate::error::UploadError;
use crate::marker::{Coordinate, Marker, MarkerId, PickOutcome};
use crate::storage::bounded;
use crate::storage::traits::StoreError;

use super::{SessionState, SyncSession};

impl SyncSession {
    /// Submit a new marker at `(latitude, longitude)` with the photo `bytes`.
    ///
    /// The pipeline runs on its own task. Dropping the returned future does
    /// not cancel it: a submission whose remote writes complete still lands
    /// in the cache.
    pub async fn submit(&self, point: (f64, f64), bytes: Vec<u8>) -> Result<Marker, UploadError> {
        self.spawn_submission(point, bytes, None).await
    }

    /// Like [`submit`](Self::submit), keeping the picked file's extension on
    /// the storage key.
    pub async fn submit_named(
        &self,
        point: (f64, f64),
        bytes: Vec<u8>,
        file_name: impl Into<String>,
    ) -> Result<Marker, UploadError> {
        self.spawn_submission(point, bytes, Some(file_name.into())).await
    }

    /// Hand over whatever the image picker returned.
    ///
    /// A cancelled pick or a denied permission ends here with `Ok(None)`;
    /// nothing is uploaded and the cache is untouched.
    pub async fn submit_picked(
        &self,
        point: (f64, f64),
        outcome: PickOutcome,
    ) -> Result<Option<Marker>, UploadError> {
        match outcome {
            PickOutcome::Picked(bytes) => self.submit(point, bytes).await.map(Some),
            PickOutcome::Cancelled => {
                debug!("Image pick cancelled, nothing to submit");
                Ok(None)
            }
            PickOutcome::PermissionDenied => {
                debug!("Media library permission denied, nothing to submit");
                Ok(None)
            }
        }
    }

    /// Frozen view of every committed marker, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> MarkerSnapshot {
        self.cache.snapshot()
    }

    /// Look up one marker (e.g. the one the user tapped).
    #[must_use]
    pub fn marker(&self, id: &MarkerId) -> Option<Marker> {
        self.cache.get(id)
    }

    /// Fetch the photo attached to a marker.
    ///
    /// Returns `Ok(None)` if no marker with that id is cached.
    pub async fn media_bytes(&self, id: &MarkerId) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(marker) = self.cache.get(id) else {
            return Ok(None);
        };
        bounded(self.config.store_timeout(), self.media.fetch(&marker.media))
            .await
            .map(Some)
    }

    /// Map centre to show before the user interacts.
    #[must_use]
    pub fn initial_region(&self) -> Coordinate {
        self.config.initial_region
    }

    /// Number of cached markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    async fn spawn_submission(
        &self,
        point: (f64, f64),
        bytes: Vec<u8>,
        file_name: Option<String>,
    ) -> Result<Marker, UploadError> {
        // Registered before admission so a concurrent shutdown either refuses
        // this submission or waits for it.
        let guard = self.in_flight.enter();
        self.admit().await?;

        let coordinator = Arc::clone(&self.coordinator);
        let task = async move {
            let _guard = guard;
            coordinator
                .submit_marker_named(point, &bytes, file_name.as_deref())
                .await
        };

        tokio::spawn(task.in_current_span()).await.map_err(|e| {
            error!(error = %e, "Upload task did not complete");
            UploadError::Aborted
        })?
    }

    /// Wait out a running bulk fetch, then allow or refuse the submission.
    async fn admit(&self) -> Result<(), UploadError> {
        let mut rx = self.state_rx.clone();
        let state = *rx
            .wait_for(|state| *state != SessionState::Loading)
            .await
            .map_err(|_| UploadError::SessionClosed)?;

        match state {
            SessionState::Ready => Ok(()),
            SessionState::Created => Err(UploadError::NotStarted),
            SessionState::Loading | SessionState::ShuttingDown => Err(UploadError::SessionClosed),
        }
    }
}
