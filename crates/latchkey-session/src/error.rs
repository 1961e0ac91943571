//! Error types for the session layer.

use crate::SlotKey;

/// Errors that can occur while issuing tokens or touching storage.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The OS random source could not supply entropy. Fatal for the
    /// operation: no token can be issued without it.
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// The slot holds no session blob.
    #[error("no session stored in slot {0}")]
    NotFound(SlotKey),

    /// Reading, writing or removing the slot failed, or did not finish
    /// within the storage timeout (reported as
    /// [`std::io::ErrorKind::TimedOut`]).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] std::io::Error),

    /// A slot key contains characters that can't name a storage slot.
    #[error("invalid slot key: {0:?}")]
    InvalidSlot(String),
}

impl SessionError {
    /// Returns `true` if this is a storage timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::StorageUnavailable(e) if e.kind() == std::io::ErrorKind::TimedOut)
    }
}
