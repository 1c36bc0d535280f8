// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Session lifecycle: startup bulk fetch and shutdown.

use tracing::{debug, error, info, warn};

use crate::error::FetchError;
use crate::marker::{Marker, MarkerRecord};
use crate::storage::bounded;

use super::{SessionState, SyncSession};

impl SyncSession {
    /// Run the one bulk fetch and seed the cache with it.
    ///
    /// Startup flow:
    /// 1. `Created → Loading`
    /// 2. List every marker document (bounded by the store timeout)
    /// 3. Drop documents whose coordinate is invalid
    /// 4. Bulk load the rest (duplicate ids: first occurrence wins)
    /// 5. `Loading → Ready`
    ///
    /// If the listing fails the session still becomes `Ready` with an empty
    /// cache and the error is returned. There is no automatic retry; a
    /// second call returns [`FetchError::AlreadyStarted`], and a call after
    /// [`shutdown()`](Self::shutdown) returns [`FetchError::SessionClosed`].
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<(), FetchError> {
        let mut previous = SessionState::Created;
        let claimed = self.state.send_if_modified(|state| {
            previous = *state;
            if *state == SessionState::Created {
                *state = SessionState::Loading;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(match previous {
                SessionState::ShuttingDown => FetchError::SessionClosed,
                _ => FetchError::AlreadyStarted,
            });
        }

        crate::metrics::set_session_state(SessionState::Loading.as_code());
        info!("Starting sync session, fetching markers...");

        let result = bounded(self.config.store_timeout(), self.metadata.list_all()).await;

        let outcome = match result {
            Ok(records) => {
                let total = records.len();
                let markers = valid_markers(records);
                let report = self.cache.bulk_load(markers);
                crate::metrics::record_bulk_load(true, report.loaded);
                info!(
                    listed = total,
                    loaded = report.loaded,
                    duplicates = report.duplicates,
                    "Marker cache seeded"
                );
                Ok(())
            }
            Err(e) => {
                crate::metrics::record_bulk_load(false, 0);
                error!(error = %e, "Marker listing failed, starting with empty cache");
                Err(FetchError::Store(e))
            }
        };

        // A shutdown requested mid-fetch wins over Ready.
        let became_ready = self.state.send_if_modified(|state| {
            if *state == SessionState::Loading {
                *state = SessionState::Ready;
                true
            } else {
                false
            }
        });
        if became_ready {
            crate::metrics::set_session_state(SessionState::Ready.as_code());
            info!("Sync session ready");
        }

        outcome
    }

    /// Stop accepting submissions and wait for in-flight ones to land.
    ///
    /// Submissions already admitted keep running to completion, so a marker
    /// whose remote writes succeeded still reaches the cache. Submissions
    /// still waiting on admission are refused with `SessionClosed`.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        info!("Shutting down sync session...");
        self.set_state(SessionState::ShuttingDown);

        let pending = self.in_flight();
        if pending > 0 {
            debug!(pending, "Waiting for in-flight submissions");
        }
        self.in_flight.wait_idle().await;

        info!(markers = self.cache.len(), "Sync session shut down");
    }
}

fn valid_markers(records: Vec<MarkerRecord>) -> Vec<Marker> {
    let mut skipped = 0;
    let markers: Vec<Marker> = records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match record.into_marker() {
                Ok(marker) => Some(marker),
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping marker record with invalid coordinate");
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    if skipped > 0 {
        crate::metrics::record_skipped_records("invalid_coordinate", skipped);
    }
    markers
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SyncSessionConfig;
    use crate::marker::{MarkerId, MediaRef};
    use crate::storage::memory::{InMemoryMediaStore, InMemoryMetadataStore};

    fn record(id: &str, latitude: f64, longitude: f64) -> MarkerRecord {
        MarkerRecord {
            id: MarkerId::from(id),
            latitude,
            longitude,
            media: MediaRef::from_store(format!("mem://media/images/{}", id)),
            created_at: 0,
        }
    }

    fn session_over(metadata: Arc<InMemoryMetadataStore>) -> SyncSession {
        SyncSession::new(
            SyncSessionConfig::default(),
            Arc::new(InMemoryMediaStore::default()),
            metadata,
        )
    }

    #[test]
    fn test_valid_markers_drops_bad_coordinates() {
        let markers = valid_markers(vec![
            record("a", 10.0, 10.0),
            record("b", 95.0, 10.0),
            record("c", 0.0, f64::NAN),
            record("d", -10.0, -170.0),
        ]);
        let ids: Vec<_> = markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[tokio::test]
    async fn test_start_loads_listing_in_order() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        metadata.seed(record("first", 1.0, 1.0));
        metadata.seed(record("second", 2.0, 2.0));
        let session = session_over(metadata);

        session.start().await.unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        let ids: Vec<_> = session.snapshot().iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let session = session_over(Arc::new(InMemoryMetadataStore::new()));
        session.start().await.unwrap();

        assert!(matches!(session.start().await, Err(FetchError::AlreadyStarted)));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_in_flight_returns() {
        let session = session_over(Arc::new(InMemoryMetadataStore::new()));
        session.start().await.unwrap();

        session.shutdown().await;

        assert_eq!(session.state(), SessionState::ShuttingDown);
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_start_after_shutdown_is_rejected() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        metadata.seed(record("a", 1.0, 1.0));
        let session = session_over(metadata);
        session.start().await.unwrap();
        session.shutdown().await;

        assert!(matches!(session.start().await, Err(FetchError::SessionClosed)));
        assert_eq!(session.state(), SessionState::ShuttingDown);

        let err = session.submit((1.0, 1.0), b"photo".to_vec()).await.unwrap_err();
        assert!(matches!(err, crate::error::UploadError::SessionClosed));
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_start_after_shutdown_without_start_is_rejected() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        metadata.seed(record("a", 1.0, 1.0));
        let session = session_over(metadata);
        session.shutdown().await;

        assert!(matches!(session.start().await, Err(FetchError::SessionClosed)));
        assert_eq!(session.state(), SessionState::ShuttingDown);
        assert!(session.is_empty());
    }
}
