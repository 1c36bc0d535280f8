//! # Geomark Sync
//!
//! Ingestion and synchronization pipeline for geo-tagged media markers: pick
//! a photo, store it, pin it to a coordinate, and make the marker visible to
//! every reader of the same dataset.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Sync Session                         │
//! │  • start(): one bulk fetch from the metadata store          │
//! │  • submit(): runs the upload pipeline on a detached task    │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                              │
//!                  ▼                              ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │      Upload Coordinator      │  │       Marker Cache       │
//! │  validate → put → locator    │─►│  bulk_load / append      │
//! │  → insert → append           │  │  snapshot (copy-on-write)│
//! └──────────────────────────────┘  └──────────────────────────┘
//!          │                │
//!          ▼                ▼
//! ┌────────────────┐  ┌────────────────┐
//! │  Media Store   │  │ Metadata Store │
//! │  put / locator │  │ insert / list  │
//! └────────────────┘  └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geomark_sync::{SyncSession, SyncSessionConfig};
//! use geomark_sync::storage::memory::{InMemoryMediaStore, InMemoryMetadataStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = SyncSession::new(
//!         SyncSessionConfig::default(),
//!         Arc::new(InMemoryMediaStore::default()),
//!         Arc::new(InMemoryMetadataStore::new()),
//!     );
//!
//!     // Seed the cache from the remote listing
//!     session.start().await.expect("Failed to fetch markers");
//!
//!     // Drop a photo on Copenhagen
//!     let marker = session
//!         .submit((55.6761, 12.5683), std::fs::read("photo.jpg").unwrap())
//!         .await
//!         .expect("Failed to submit");
//!
//!     for m in session.snapshot().iter() {
//!         println!("{} at {} -> {}", m.id, m.coordinate, m.media);
//!     }
//!     assert!(session.snapshot().contains(&marker.id));
//!
//!     session.shutdown().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`session`]: The [`SyncSession`] lifecycle and API
//! - [`upload`]: The [`UploadCoordinator`] pipeline
//! - [`cache`]: The [`MarkerCache`] and its snapshots
//! - [`storage`]: Store traits and in-memory implementations
//! - [`resilience`]: Optional retry decorator for store handles

pub mod config;
pub mod marker;
pub mod error;
pub mod storage;
pub mod cache;
pub mod upload;
pub mod session;
pub mod resilience;
pub mod metrics;

pub use config::SyncSessionConfig;
pub use marker::{
    Coordinate, Marker, MarkerId, MarkerRecord, MediaRef, NewMarkerRecord, PickOutcome,
};
pub use error::{CacheError, FetchError, UploadError};
pub use storage::traits::{MediaStore, MetadataStore, StoreError};
pub use cache::{BulkLoadReport, MarkerCache, MarkerSnapshot};
pub use upload::{derive_storage_key, UploadCoordinator};
pub use session::{SessionState, SyncSession};
pub use resilience::retry::{RetryConfig, Retrying};
pub use metrics::StageTimer;
