//! Public types for the sync session.

/// Session lifecycle state.
///
/// Use [`super::SyncSession::state()`] to check current state or
/// [`super::SyncSession::state_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just created, `start()` not called yet
    Created,
    /// Bulk fetch in progress
    Loading,
    /// Accepting submissions
    Ready,
    /// Shutdown requested; new submissions are refused
    ShuttingDown,
}

impl SessionState {
    /// Numeric code for the session state gauge.
    #[must_use]
    pub fn as_code(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Loading => 1,
            Self::Ready => 2,
            Self::ShuttingDown => 3,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Loading => write!(f, "Loading"),
            Self::Ready => write!(f, "Ready"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}
