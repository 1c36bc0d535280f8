//! Integration Tests for Geomark Sync
//!
//! End-to-end session scenarios over the in-memory stores.
//!
//! # Running Tests
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//! - `happy_*` - Normal operation: startup, submission, visibility
//! - `concurrent_*` - Interleaved submissions and startup races

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use geomark_sync::storage::memory::{InMemoryMediaStore, InMemoryMetadataStore};
use geomark_sync::{
    Coordinate, MarkerId, MarkerRecord, MediaRef, MediaStore, MetadataStore, NewMarkerRecord,
    SessionState, StoreError, SyncSession, SyncSessionConfig, UploadError,
};

// =============================================================================
// Helpers
// =============================================================================

struct Backend {
    media: Arc<InMemoryMediaStore>,
    metadata: Arc<InMemoryMetadataStore>,
}

impl Backend {
    fn new() -> Self {
        Self {
            media: Arc::new(InMemoryMediaStore::new("mapapp")),
            metadata: Arc::new(InMemoryMetadataStore::new()),
        }
    }

    fn session(&self) -> SyncSession {
        SyncSession::new(
            SyncSessionConfig::default(),
            self.media.clone(),
            self.metadata.clone(),
        )
    }
}

fn listed(id: &str, latitude: f64, longitude: f64) -> MarkerRecord {
    MarkerRecord {
        id: MarkerId::from(id),
        latitude,
        longitude,
        media: MediaRef::from_store(format!("mem://mapapp/images/{}.jpg", id)),
        created_at: 1_700_000_000_000,
    }
}

/// Metadata store whose listing blocks until the test opens the gate.
struct GatedMetadataStore {
    inner: Arc<InMemoryMetadataStore>,
    gate: Semaphore,
}

#[async_trait]
impl MetadataStore for GatedMetadataStore {
    async fn insert(&self, record: &NewMarkerRecord) -> Result<MarkerId, StoreError> {
        self.inner.insert(record).await
    }

    async fn list_all(&self) -> Result<Vec<MarkerRecord>, StoreError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.inner.list_all().await
    }
}

// =============================================================================
// Happy Path Tests
// =============================================================================

#[tokio::test]
async fn happy_copenhagen_marker_round_trip() {
    let backend = Backend::new();
    let session = backend.session();
    session.start().await.unwrap();
    let photo_bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let marker = session.submit((55.6761, 12.5683), photo_bytes.clone()).await.unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].coordinate, Coordinate::new(55.6761, 12.5683).unwrap());
    assert_eq!(backend.media.fetch(&marker.media).await.unwrap(), photo_bytes);
    assert_eq!(session.media_bytes(&marker.id).await.unwrap(), Some(photo_bytes));
}

#[tokio::test]
async fn happy_out_of_range_latitude_changes_nothing() {
    let backend = Backend::new();
    backend.metadata.seed(listed("a", 1.0, 1.0));
    let session = backend.session();
    session.start().await.unwrap();
    let before = session.snapshot();

    let err = session.submit((200.0, 12.5683), b"photo".to_vec()).await.unwrap_err();

    assert!(matches!(err, UploadError::InvalidCoordinate { .. }));
    let after = session.snapshot();
    assert_eq!(after.len(), before.len());
    assert_eq!(after.to_vec(), before.to_vec());
    assert!(backend.media.is_empty());
    assert_eq!(backend.metadata.len(), 1);
}

#[tokio::test]
async fn happy_startup_dedups_and_skips_invalid_records() {
    let backend = Backend::new();
    backend.metadata.seed(listed("a", 1.0, 1.0));
    backend.metadata.seed(listed("b", 2.0, 2.0));
    backend.metadata.seed(listed("a", 9.0, 9.0));
    backend.metadata.seed(listed("broken", 120.0, 0.0));
    backend.metadata.seed(listed("c", 3.0, 3.0));
    let session = backend.session();

    session.start().await.unwrap();

    let snapshot = session.snapshot();
    let ids: Vec<_> = snapshot.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    // First occurrence wins
    assert_eq!(snapshot[0].coordinate.latitude(), 1.0);
}

#[tokio::test]
async fn happy_marker_visible_to_other_sessions() {
    let backend = Backend::new();
    let writer = backend.session();
    writer.start().await.unwrap();
    let marker = writer.submit((48.8566, 2.3522), b"paris".to_vec()).await.unwrap();

    let reader = backend.session();
    reader.start().await.unwrap();

    let seen = reader.marker(&marker.id).expect("reader should see the new marker");
    assert_eq!(seen.coordinate, marker.coordinate);
    assert_eq!(seen.media, marker.media);
    assert_eq!(seen.created_at, marker.created_at);
    assert_eq!(reader.media_bytes(&marker.id).await.unwrap().as_deref(), Some(&b"paris"[..]));
}

#[tokio::test]
async fn happy_appends_grow_after_bulk_load() {
    let backend = Backend::new();
    backend.metadata.seed(listed("remote-1", 10.0, 10.0));
    backend.metadata.seed(listed("remote-2", 20.0, 20.0));
    let session = backend.session();
    session.start().await.unwrap();

    let mut sizes = vec![session.len()];
    for i in 0..5 {
        session.submit((i as f64, i as f64), vec![i as u8 + 1]).await.unwrap();
        sizes.push(session.len());
    }

    assert_eq!(sizes, vec![2, 3, 4, 5, 6, 7]);
    let ids: Vec<_> = session.snapshot().iter().take(2).map(|m| m.id.to_string()).collect();
    assert_eq!(ids, vec!["remote-1", "remote-2"]);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_all_land_with_unique_ids() {
    const N: usize = 32;
    let backend = Backend::new();
    backend.metadata.seed(listed("seed", 0.0, 0.0));
    let session = Arc::new(backend.session());
    session.start().await.unwrap();

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let session = session.clone();
            tokio::spawn(async move {
                let payload = format!("photo-{}", i).into_bytes();
                let marker = session
                    .submit((i as f64, -(i as f64)), payload.clone())
                    .await
                    .unwrap();
                (marker, payload)
            })
        })
        .collect();

    let mut submitted = Vec::new();
    for handle in handles {
        submitted.push(handle.await.unwrap());
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), N + 1);
    assert_eq!(snapshot[0].id.as_str(), "seed");

    let unique: HashSet<_> = snapshot.iter().map(|m| m.id.clone()).collect();
    assert_eq!(unique.len(), N + 1);

    for (marker, payload) in submitted {
        assert!(snapshot.contains(&marker.id));
        assert_eq!(backend.media.fetch(&marker.media).await.unwrap(), payload);
    }
    assert_eq!(backend.media.len(), N);
}

#[tokio::test]
async fn concurrent_submit_during_startup_lands_after_bulk_load() {
    let inner = Arc::new(InMemoryMetadataStore::new());
    inner.seed(listed("remote", 1.0, 1.0));
    let metadata = Arc::new(GatedMetadataStore { inner: inner.clone(), gate: Semaphore::new(0) });
    let session = Arc::new(SyncSession::new(
        SyncSessionConfig::default(),
        Arc::new(InMemoryMediaStore::default()),
        metadata.clone(),
    ));

    let starter = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };
    let mut state = session.state_receiver();
    state.wait_for(|s| *s == SessionState::Loading).await.unwrap();

    let submitter = {
        let session = session.clone();
        tokio::spawn(async move { session.submit((2.0, 2.0), b"early".to_vec()).await })
    };
    tokio::task::yield_now().await;
    assert!(session.is_empty());

    metadata.gate.add_permits(1);
    starter.await.unwrap().unwrap();
    let marker = submitter.await.unwrap().unwrap();

    let ids: Vec<_> = session.snapshot().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec![MarkerId::from("remote"), marker.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_shutdown_leaves_no_late_writes() {
    const N: usize = 64;
    let backend = Backend::new();
    let session = Arc::new(backend.session());
    session.start().await.unwrap();

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let session = session.clone();
            tokio::spawn(async move {
                session.submit((i as f64 / 2.0, 0.0), vec![1, i as u8]).await
            })
        })
        .collect();
    session.shutdown().await;

    let blobs_at_shutdown = backend.media.len();
    let docs_at_shutdown = backend.metadata.len();
    let cached_at_shutdown = session.len();

    let mut landed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => landed += 1,
            Err(e) => assert!(matches!(e, UploadError::SessionClosed)),
        }
    }

    assert_eq!(backend.media.len(), blobs_at_shutdown);
    assert_eq!(backend.metadata.len(), docs_at_shutdown);
    assert_eq!(session.len(), cached_at_shutdown);
    assert_eq!(cached_at_shutdown, landed);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn concurrent_snapshot_is_stable_while_submissions_commit() {
    let backend = Backend::new();
    let session = Arc::new(backend.session());
    session.start().await.unwrap();
    session.submit((1.0, 1.0), b"one".to_vec()).await.unwrap();

    let frozen = session.snapshot();
    for i in 0..10 {
        session.submit((i as f64, 0.0), vec![i as u8 + 1]).await.unwrap();
    }

    assert_eq!(frozen.len(), 1);
    assert_eq!(session.len(), 11);
}
