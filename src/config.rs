//! Configuration for a sync session.
//!
//! # Example
//!
//! ```
//! use geomark_sync::SyncSessionConfig;
//! use std::time::Duration;
//!
//! let config = SyncSessionConfig::default();
//! assert_eq!(config.media_prefix, "images");
//! assert_eq!(config.store_timeout(), Duration::from_secs(30));
//!
//! let config = SyncSessionConfig {
//!     media_prefix: "markers/photos".into(),
//!     store_timeout_ms: 5_000,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::marker::Coordinate;

/// Configuration for a [`SyncSession`](crate::SyncSession).
///
/// Every field has a default, so a partial document deserializes.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSessionConfig {
    /// Key namespace for uploaded media (keys become `<prefix>/<id>[.ext]`)
    #[serde(default = "default_media_prefix")]
    pub media_prefix: String,

    /// Upper bound for each media/metadata store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Largest accepted media payload in bytes
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: usize,

    /// Map centre shown before any marker is selected
    #[serde(default = "default_initial_region")]
    pub initial_region: Coordinate,
}

fn default_media_prefix() -> String { "images".to_string() }
fn default_store_timeout_ms() -> u64 { 30_000 }
fn default_max_media_bytes() -> usize { 20 * 1024 * 1024 } // 20 MB
fn default_initial_region() -> Coordinate { Coordinate::COPENHAGEN }

impl Default for SyncSessionConfig {
    fn default() -> Self {
        Self {
            media_prefix: default_media_prefix(),
            store_timeout_ms: default_store_timeout_ms(),
            max_media_bytes: default_max_media_bytes(),
            initial_region: default_initial_region(),
        }
    }
}

impl SyncSessionConfig {
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
