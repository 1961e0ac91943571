//! Token issuance.

use std::time::Duration;

use latchkey_protocol::SessionRecord;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::{Clock, SessionError};

/// Dispenses fresh session records.
///
/// Each record carries `token_length_bytes` bytes from the OS random
/// source, hex-encoded (so the token string is twice that long), and an
/// absolute expiry of `now + ttl`.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    token_length_bytes: usize,
    ttl_secs: i64,
}

impl TokenGenerator {
    /// Creates a generator. TTLs beyond `i64::MAX` seconds saturate.
    pub fn new(token_length_bytes: usize, ttl: Duration) -> Self {
        Self {
            token_length_bytes,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Length in characters of every token this generator produces.
    pub fn token_len(&self) -> usize {
        self.token_length_bytes * 2
    }

    /// Draws a new token and stamps its expiry from `clock`.
    ///
    /// Uses `OsRng` directly rather than a thread-local generator so an
    /// entropy failure is reported instead of panicking.
    ///
    /// # Errors
    /// Returns [`SessionError::RandomnessUnavailable`] if the OS random
    /// source fails.
    pub fn dispense(&self, clock: &impl Clock) -> Result<SessionRecord, SessionError> {
        let mut bytes = vec![0u8; self.token_length_bytes];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::RandomnessUnavailable(e.to_string()))?;

        let expires_at = clock.now().saturating_add(self.ttl_secs);
        Ok(SessionRecord::new(hex::encode(bytes), expires_at))
    }
}
