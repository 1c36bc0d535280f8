// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic with exponential backoff, for use around store handles.
//!
//! The upload pipeline itself never retries. Callers that want retries wrap
//! a store in [`Retrying`] before handing it to the session; only calls that
//! are safe to repeat are retried (a `put` under the same key, locator
//! lookups, fetches and listings). `insert` is passed through once, since a
//! repeated insert would create a second document.
//!
//! # Example
//!
//! ```
//! use geomark_sync::RetryConfig;
//!
//! // Startup: a few attempts, then give up
//! let startup = RetryConfig::startup();
//! assert_eq!(startup.max_retries, 5);
//!
//! // Query: quick retry, then fail
//! let query = RetryConfig::query();
//! assert_eq!(query.max_retries, 3);
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::marker::{MarkerId, MarkerRecord, MediaRef, NewMarkerRecord};
use crate::storage::traits::{MediaStore, MetadataStore, StoreError};

/// Configuration for operation retry behavior.
///
/// Use the preset constructors for common patterns:
/// - [`RetryConfig::startup()`] - For the one-off bulk listing
/// - [`RetryConfig::query()`] - Quick retry for individual calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts, including the first one
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::query()
    }
}

impl RetryConfig {
    /// Attempts 5 times with exponential backoff, failing after ~5 seconds.
    #[must_use]
    pub fn startup() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// 3 attempts with fast backoff - if it fails, let caller handle it.
    #[must_use]
    pub fn query() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Fast retry for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }
}

pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!("Operation '{}' succeeded after {} retries", operation_name, attempts);
                }
                return Ok(val);
            }
            Err(err) => {
                attempts += 1;
                if attempts >= config.max_retries {
                    return Err(err);
                }

                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name, attempts, config.max_retries, err, delay
                );

                sleep(delay).await;
                delay = (delay.mul_f64(config.factor)).min(config.max_delay);
            }
        }
    }
}

/// Store decorator that retries repeatable calls.
pub struct Retrying<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> Retrying<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MediaStore> MediaStore for Retrying<S> {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        retry("media_put", &self.config, || self.inner.put(key, bytes)).await
    }

    async fn locator(&self, key: &str) -> Result<MediaRef, StoreError> {
        retry("media_locator", &self.config, || self.inner.locator(key)).await
    }

    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, StoreError> {
        retry("media_fetch", &self.config, || self.inner.fetch(media)).await
    }
}

#[async_trait]
impl<S: MetadataStore> MetadataStore for Retrying<S> {
    async fn insert(&self, record: &NewMarkerRecord) -> Result<MarkerId, StoreError> {
        self.inner.insert(record).await
    }

    async fn list_all(&self) -> Result<Vec<MarkerRecord>, StoreError> {
        retry("metadata_list_all", &self.config, || self.inner.list_all()).await
    }
}
