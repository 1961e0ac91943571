//! The storage seam: where encrypted session blobs live.
//!
//! Today there is one administrator and so one slot ([`SlotKey::admin`]).
//! The store is keyed anyway so that several principals only need
//! several keys, not a different store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SlotKey
// ---------------------------------------------------------------------------

/// Names one session slot.
///
/// Restricted to `[A-Za-z0-9_-]`, at most 64 characters, so a key can be
/// used as a file-name suffix without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey(String);

/// The slot used by the single-admin deployment.
const ADMIN_SLOT: &str = "admin";

impl SlotKey {
    /// Validates and wraps a slot name.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSlot`] for empty, overlong, or
    /// non-`[A-Za-z0-9_-]` names.
    pub fn new(name: impl Into<String>) -> Result<Self, SessionError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= 64
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(name))
        } else {
            Err(SessionError::InvalidSlot(name))
        }
    }

    /// The single administrator slot.
    pub fn admin() -> Self {
        Self(ADMIN_SLOT.to_string())
    }

    /// Returns `true` for [`SlotKey::admin`].
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_SLOT
    }

    /// The slot name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Durable storage for encrypted session blobs, one per slot.
///
/// # Contract
///
/// - `persist` overwrites the slot; a concurrent `load` sees either the
///   old blob or the new one, never a mix.
/// - `load` returns [`SessionError::NotFound`] for an empty slot.
/// - `delete` is idempotent: removing an empty slot is `Ok(())`.
/// - `compare_and_swap` writes only if the slot currently holds exactly
///   `expected`, atomically with respect to every other writer of the
///   same store.
/// - Nothing blocks forever. Implementations bound their I/O and report
///   overruns as [`SessionError::StorageUnavailable`].
pub trait SessionStore: Send + Sync + 'static {
    /// Overwrites `slot` with `blob`.
    fn persist(
        &self,
        slot: &SlotKey,
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Reads the blob in `slot`.
    fn load(
        &self,
        slot: &SlotKey,
    ) -> impl Future<Output = Result<Vec<u8>, SessionError>> + Send;

    /// Empties `slot`. Succeeds if it was already empty.
    fn delete(
        &self,
        slot: &SlotKey,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Replaces the blob in `slot` with `blob` if and only if it still
    /// equals `expected`.
    ///
    /// Returns `Ok(false)` if the slot changed or is empty; nothing is
    /// written in that case.
    fn compare_and_swap(
        &self,
        slot: &SlotKey,
        expected: &[u8],
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<bool, SessionError>> + Send;
}

/// Lets several gates (or a gate and a test) share one store.
impl<S: SessionStore> SessionStore for Arc<S> {
    fn persist(
        &self,
        slot: &SlotKey,
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<(), SessionError>> + Send {
        (**self).persist(slot, blob)
    }

    fn load(
        &self,
        slot: &SlotKey,
    ) -> impl Future<Output = Result<Vec<u8>, SessionError>> + Send {
        (**self).load(slot)
    }

    fn delete(
        &self,
        slot: &SlotKey,
    ) -> impl Future<Output = Result<(), SessionError>> + Send {
        (**self).delete(slot)
    }

    fn compare_and_swap(
        &self,
        slot: &SlotKey,
        expected: &[u8],
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<bool, SessionError>> + Send {
        (**self).compare_and_swap(slot, expected, blob)
    }
}
