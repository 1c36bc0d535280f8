// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync session.
//!
//! The [`SyncSession`] owns the process-lifetime pieces:
//! - the [`MarkerCache`] every reader draws from
//! - the [`UploadCoordinator`] every new marker goes through
//! - explicitly injected media and metadata store handles
//!
//! # Lifecycle
//!
//! ```text
//! Created → Loading → Ready → ShuttingDown
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geomark_sync::{SyncSession, SyncSessionConfig, SessionState};
//! use geomark_sync::storage::memory::{InMemoryMediaStore, InMemoryMetadataStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let session = SyncSession::new(
//!     SyncSessionConfig::default(),
//!     Arc::new(InMemoryMediaStore::default()),
//!     Arc::new(InMemoryMetadataStore::new()),
//! );
//! assert_eq!(session.state(), SessionState::Created);
//!
//! session.start().await.expect("bulk fetch failed");
//! let marker = session.submit((55.6761, 12.5683), b"photo".to_vec()).await.unwrap();
//! assert!(session.snapshot().contains(&marker.id));
//! # }
//! ```

mod api;
mod lifecycle;
mod types;

pub use types::SessionState;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

use crate::cache::MarkerCache;
use crate::config::SyncSessionConfig;
use crate::storage::traits::{MediaStore, MetadataStore};
use crate::upload::UploadCoordinator;

/// Process-scoped owner of the marker cache.
///
/// # Thread Safety
///
/// `Send + Sync`; share it behind an `Arc`. Submissions may run
/// concurrently, appends to the cache are serialized internally.
pub struct SyncSession {
    config: SyncSessionConfig,

    /// Session state (broadcast to watchers)
    state: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,

    cache: Arc<MarkerCache>,
    coordinator: Arc<UploadCoordinator>,

    /// Kept for selection lookups (`media_bytes`)
    media: Arc<dyn MediaStore>,
    /// Kept for the startup bulk fetch
    metadata: Arc<dyn MetadataStore>,

    in_flight: Arc<InFlight>,
}

impl SyncSession {
    /// Create a session over the given stores.
    ///
    /// The session starts in `Created` state. Call [`start()`](Self::start)
    /// to run the bulk fetch and transition to `Ready`.
    pub fn new(
        config: SyncSessionConfig,
        media: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Created);
        let cache = Arc::new(MarkerCache::new());
        let coordinator = Arc::new(UploadCoordinator::new(
            &config,
            Arc::clone(&media),
            Arc::clone(&metadata),
            Arc::clone(&cache),
        ));

        Self {
            config,
            state: state_tx,
            state_rx,
            cache,
            coordinator,
            media,
            metadata,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Get current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    #[must_use]
    pub fn config(&self) -> &SyncSessionConfig {
        &self.config
    }

    /// Number of detached submissions not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    fn set_state(&self, next: SessionState) {
        let _ = self.state.send(next);
        crate::metrics::set_session_state(next.as_code());
    }
}

/// Counts detached submissions so shutdown can wait for them.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { tracker: Arc::clone(self) }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct InFlightGuard {
    tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.tracker.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}
