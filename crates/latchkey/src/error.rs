//! Unified error type for the gate.

use latchkey_protocol::ProtocolError;
use latchkey_session::SessionError;

use crate::ConfigError;

/// Top-level error for gate operations.
///
/// Any `Err` from the gate means "not authenticated". Data-driven
/// failures (bad cookie, tampered or stale session) never show up here;
/// they are an `Ok(false)`. What remains are local faults and policy.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Credentials were submitted over an insecure transport while the
    /// deployment requires a secure one. Nothing was checked or changed.
    #[error("connection is insecure, login cannot proceed")]
    PolicyViolation,

    /// Token issuance or storage failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Encoding or encrypting outgoing session data failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Producing a password hash failed.
    #[error("credential hashing failed: {0}")]
    Credential(String),
}
