// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Storage collaborators (media blobs, marker documents).

pub mod memory;
pub mod traits;

use std::future::Future;
use std::time::Duration;

use self::traits::StoreError;

/// Run one collaborator call with an upper bound on how long it may suspend.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
