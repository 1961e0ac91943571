//! Administrator credential checks.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::GateError;

/// Salt length for new hashes.
const SALT_LEN: usize = 16;

/// Checks a submitted password against the configured hash.
///
/// Implementations must not short-circuit on obviously wrong input in a
/// way that depends on the stored hash: the gate calls this for every
/// login attempt, including ones with the wrong email.
pub trait CredentialVerifier: Send + Sync + 'static {
    /// True if `password` matches `stored_hash`. A malformed hash is a
    /// mismatch.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// Verifies PHC-format Argon2 hashes (`$argon2id$v=19$...`).
///
/// Cost parameters are read from the stored hash, so hashes made with
/// any Argon2 variant or cost verify correctly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl Argon2Verifier {
    /// Hashes `password` with the default Argon2id parameters and a
    /// fresh random salt. The result goes into `admin_password_hash`.
    ///
    /// # Errors
    /// Returns [`GateError::Credential`] if the OS RNG or the hasher fails.
    pub fn hash_password(password: &str) -> Result<String, GateError> {
        Self::hash_password_with(&Argon2::default(), password)
    }

    /// Like [`hash_password`](Self::hash_password) with caller-chosen
    /// parameters.
    ///
    /// # Errors
    /// Returns [`GateError::Credential`] if the OS RNG or the hasher fails.
    pub fn hash_password_with(argon2: &Argon2<'_>, password: &str) -> Result<String, GateError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| GateError::Credential(format!("salt generation: {e}")))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| GateError::Credential(format!("salt encoding: {e}")))?;
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| GateError::Credential(format!("hashing: {e}")))?;
        Ok(hash.to_string())
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("configured admin password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
