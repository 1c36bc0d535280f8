// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error taxonomy for marker ingestion and session startup.
//!
//! Each upload stage has its own variant so callers can tell exactly where a
//! submission stopped. Collaborator failures are carried as [`StoreError`].

use thiserror::Error;

use crate::marker::MarkerId;
pub use crate::storage::traits::StoreError;

/// Failure of a single marker submission.
///
/// Whatever the variant, the marker cache is left exactly as it was before
/// the submission started.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("media payload is empty")]
    EmptyMedia,

    #[error("media payload of {size} bytes exceeds limit of {limit} bytes")]
    MediaTooLarge { size: usize, limit: usize },

    #[error("media upload failed: {0}")]
    UploadFailed(#[source] StoreError),

    #[error("media stored but locator unavailable: {0}")]
    LocatorUnavailable(#[source] StoreError),

    #[error("marker metadata insert failed: {0}")]
    PersistFailed(#[source] StoreError),

    #[error("marker id '{0}' already present in cache")]
    DuplicateId(MarkerId),

    #[error("session not started")]
    NotStarted,

    #[error("upload task aborted before completion")]
    Aborted,

    #[error("session is shutting down")]
    SessionClosed,
}

impl UploadError {
    /// Pipeline stage label, used for logs and metrics.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidCoordinate { .. } | Self::EmptyMedia | Self::MediaTooLarge { .. } => {
                "validate"
            }
            Self::UploadFailed(_) => "put",
            Self::LocatorUnavailable(_) => "locator",
            Self::PersistFailed(_) => "insert",
            Self::DuplicateId(_) => "append",
            Self::NotStarted | Self::Aborted | Self::SessionClosed => "session",
        }
    }

    /// True when the failure happened before any collaborator was called.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.stage() == "validate" || matches!(self, Self::NotStarted | Self::SessionClosed)
    }
}

/// Failure of the startup bulk fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("marker listing failed: {0}")]
    Store(#[from] StoreError),

    #[error("session already started")]
    AlreadyStarted,

    #[error("session has been shut down")]
    SessionClosed,
}

/// Rejection from the marker cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("marker id '{0}' already present in cache")]
    DuplicateId(MarkerId),
}

impl From<CacheError> for UploadError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::DuplicateId(id) => UploadError::DuplicateId(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        let backend = || StoreError::Backend("down".into());
        assert_eq!(UploadError::EmptyMedia.stage(), "validate");
        assert_eq!(UploadError::UploadFailed(backend()).stage(), "put");
        assert_eq!(UploadError::LocatorUnavailable(backend()).stage(), "locator");
        assert_eq!(UploadError::PersistFailed(backend()).stage(), "insert");
        assert_eq!(UploadError::DuplicateId(MarkerId::from("x")).stage(), "append");
    }

    #[test]
    fn test_is_local() {
        assert!(UploadError::InvalidCoordinate { latitude: 200.0, longitude: 0.0 }.is_local());
        assert!(UploadError::SessionClosed.is_local());
        assert!(UploadError::NotStarted.is_local());
        assert!(!UploadError::Aborted.is_local());
        assert!(!UploadError::UploadFailed(StoreError::NotFound).is_local());
    }

    #[test]
    fn test_cache_error_converts() {
        let err: UploadError = CacheError::DuplicateId(MarkerId::from("dup")).into();
        assert!(matches!(err, UploadError::DuplicateId(id) if id.as_str() == "dup"));
    }

    #[test]
    fn test_display_includes_source() {
        let err = UploadError::PersistFailed(StoreError::Backend("quota exceeded".into()));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
