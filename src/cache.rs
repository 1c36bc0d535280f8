// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory marker cache.
//!
//! The single source of truth readers draw from. It is an append log seeded
//! by one authoritative bulk load:
//!
//! ```text
//! bulk_load(listing) ──► [m1, m2, m3]          (full replace)
//! append(m4)         ──► [m1, m2, m3, m4]      (grow only)
//! snapshot()         ──► Arc<[m1..m4]>         (frozen view)
//! ```
//!
//! Writes swap in a new version under a short write lock; a snapshot just
//! clones the current `Arc`, so readers never see a half-applied write and
//! never wait on upload I/O (no lock is held across an await).

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::marker::{Marker, MarkerId};

/// Immutable view of the cache at one point in time.
#[derive(Debug, Clone, Default)]
pub struct MarkerSnapshot {
    markers: Arc<Vec<Marker>>,
}

impl MarkerSnapshot {
    #[must_use]
    pub fn contains(&self, id: &MarkerId) -> bool {
        self.markers.iter().any(|m| &m.id == id)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Marker> {
        self.markers.as_ref().clone()
    }
}

impl Deref for MarkerSnapshot {
    type Target = [Marker];

    fn deref(&self) -> &Self::Target {
        self.markers.as_slice()
    }
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkLoadReport {
    /// Markers now in the cache
    pub loaded: usize,
    /// Later occurrences of an already-seen id that were dropped
    pub duplicates: usize,
}

#[derive(Default)]
struct CacheState {
    markers: Arc<Vec<Marker>>,
    ids: HashSet<MarkerId>,
    loaded: bool,
}

/// Ordered, id-unique marker collection.
#[derive(Default)]
pub struct MarkerCache {
    state: RwLock<CacheState>,
}

impl MarkerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with `markers`, keeping listing order.
    ///
    /// Duplicate ids resolve first-wins: the earliest occurrence keeps its
    /// position and payload, later ones are dropped and counted. Calling
    /// this again replaces everything again; it never merges.
    pub fn bulk_load<I>(&self, markers: I) -> BulkLoadReport
    where
        I: IntoIterator<Item = Marker>,
    {
        let mut ids = HashSet::new();
        let mut kept = Vec::new();
        let mut duplicates = 0;

        for marker in markers {
            if ids.insert(marker.id.clone()) {
                kept.push(marker);
            } else {
                warn!(id = %marker.id, "Duplicate marker id in listing, keeping first occurrence");
                duplicates += 1;
            }
        }

        let loaded = kept.len();
        {
            let mut state = self.state.write();
            state.markers = Arc::new(kept);
            state.ids = ids;
            state.loaded = true;
        }

        crate::metrics::set_cache_markers(loaded);
        debug!(loaded, duplicates, "Marker cache bulk loaded");
        BulkLoadReport { loaded, duplicates }
    }

    /// Add one marker at the end.
    ///
    /// Rejects a marker whose id is already cached; the cache is unchanged
    /// in that case.
    pub fn append(&self, marker: Marker) -> Result<(), CacheError> {
        let len = {
            let mut state = self.state.write();
            if state.ids.contains(&marker.id) {
                return Err(CacheError::DuplicateId(marker.id));
            }
            state.ids.insert(marker.id.clone());
            // Clones the vector only if a snapshot still holds the old version.
            Arc::make_mut(&mut state.markers).push(marker);
            state.markers.len()
        };

        crate::metrics::set_cache_markers(len);
        Ok(())
    }

    /// Frozen view of the last committed state. Never fails.
    #[must_use]
    pub fn snapshot(&self) -> MarkerSnapshot {
        MarkerSnapshot {
            markers: Arc::clone(&self.state.read().markers),
        }
    }

    #[must_use]
    pub fn get(&self, id: &MarkerId) -> Option<Marker> {
        let state = self.state.read();
        if !state.ids.contains(id) {
            return None;
        }
        state.markers.iter().find(|m| &m.id == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &MarkerId) -> bool {
        self.state.read().ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a bulk load has run at least once.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }
}
