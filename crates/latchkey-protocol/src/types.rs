//! The session record: the server's half of a login.
//!
//! A record holds exactly two things:
//! - WHICH token the client must present next (`token`)
//! - UNTIL WHEN that token is accepted (`expires_at`, unix seconds)
//!
//! The store holds at most one record per slot. Each successful
//! validation replaces it wholesale with a fresh one.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// One active login.
///
/// `token` is a lowercase hex string of `2 × token_length_bytes`
/// characters. `expires_at` is an absolute unix timestamp in seconds; the
/// token is accepted while `now < expires_at`.
///
/// `deny_unknown_fields` keeps the canonical form strict: a blob with
/// extra keys is a parse failure, not a silently accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionRecord {
    /// The opaque token the client must present.
    pub token: String,

    /// Absolute expiry, unix seconds.
    pub expires_at: i64,
}

impl SessionRecord {
    /// Creates a record. Does not validate; see [`validate`](Self::validate).
    pub fn new(token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Returns `true` if the record is still within its lifetime at `now`.
    ///
    /// The boundary is exclusive: at `now == expires_at` the record is
    /// already dead.
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.expires_at
    }

    /// Returns `true` if `presented` is this record's token.
    ///
    /// An empty presented token never matches, even against a (corrupt)
    /// empty stored token.
    pub fn matches(&self, presented: &str) -> bool {
        !presented.is_empty()
            && constant_time_eq(self.token.as_bytes(), presented.as_bytes())
    }

    /// Returns `true` if the record accepts `presented` at `now`.
    pub fn accepts(&self, presented: &str, now: i64) -> bool {
        // Evaluate both so a live-but-wrong and a dead-but-right token
        // take the same path.
        let matched = self.matches(presented);
        let live = self.is_live_at(now);
        matched && live
    }

    /// Checks the record format: a non-empty, even-length, lowercase hex
    /// token.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRecord`] describing the violation.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.token.is_empty() {
            return Err(ProtocolError::InvalidRecord("empty token".into()));
        }
        if self.token.len() % 2 != 0 {
            return Err(ProtocolError::InvalidRecord("token has odd length".into()));
        }
        if !self
            .token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(ProtocolError::InvalidRecord("token is not lowercase hex".into()));
        }
        Ok(())
    }
}

/// Constant-time byte comparison.
///
/// Length is not secret here (every token has the configured length), so
/// a length mismatch returns early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
