//! Symmetric encryption and per-purpose key derivation.
//!
//! Two things travel encrypted: the session blob at rest and the token in
//! the cookie. They're encrypted under different keys, both derived from
//! the one configured secret, so a ciphertext taken from one place can
//! never be replayed into the other.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use hmac::{Hmac, Mac};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::ProtocolError;

/// XChaCha20 nonce size (24 bytes / 192 bits). Large enough that random
/// nonces never collide in practice.
const NONCE_LEN: usize = 24;

/// Poly1305 tag size.
const TAG_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A 256-bit symmetric key.
///
/// `Debug` is implemented by hand so keys never show up in logs or
/// panic messages.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; 32]);

impl CipherKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives the key for `purpose` from `secret`.
    ///
    /// `HMAC-SHA256(secret, purpose label)`. The secret is the HMAC key,
    /// so any secret length works.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidKey`] if `secret` is empty.
    pub fn derive(secret: &[u8], purpose: KeyPurpose) -> Result<Self, ProtocolError> {
        if secret.is_empty() {
            return Err(ProtocolError::InvalidKey("secret is empty".into()));
        }
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|e| ProtocolError::InvalidKey(e.to_string()))?;
        mac.update(purpose.label().as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&mac.finalize().into_bytes());
        Ok(Self(key))
    }

    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// What a derived key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Encrypting the session record at rest.
    SessionRecord,
    /// Encrypting the token inside the client cookie.
    Cookie,
}

impl KeyPurpose {
    /// The domain-separation label fed to the KDF.
    pub fn label(self) -> &'static str {
        match self {
            Self::SessionRecord => "latchkey/session-record/v1",
            Self::Cookie => "latchkey/cookie/v1",
        }
    }
}

/// The pair of keys the gate works with.
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    /// Key for the stored session blob.
    pub session: CipherKey,
    /// Key for the cookie value.
    pub cookie: CipherKey,
}

impl DerivedKeys {
    /// Derives both keys from one configured secret.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidKey`] if `secret` is empty.
    pub fn from_secret(secret: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            session: CipherKey::derive(secret, KeyPurpose::SessionRecord)?,
            cookie: CipherKey::derive(secret, KeyPurpose::Cookie)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

/// Authenticated symmetric encryption.
///
/// `decrypt` must fail (not return garbage) on a wrong key or any
/// modified byte. Callers rely on that to detect tampering.
pub trait Cipher: Send + Sync + 'static {
    /// Encrypts `plaintext` under `key`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encryption`] if no nonce could be drawn or
    /// the cipher rejects the input.
    fn encrypt(&self, plaintext: &[u8], key: &CipherKey) -> Result<Vec<u8>, ProtocolError>;

    /// Decrypts and authenticates `ciphertext` under `key`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decryption`] on a wrong key, truncated
    /// input, or tampered ciphertext.
    fn decrypt(&self, ciphertext: &[u8], key: &CipherKey) -> Result<Vec<u8>, ProtocolError>;
}

/// XChaCha20-Poly1305 with a random nonce per message.
///
/// Output layout: `nonce (24) || ciphertext || tag (16)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XChaChaCipher;

impl Cipher for XChaChaCipher {
    fn encrypt(&self, plaintext: &[u8], key: &CipherKey) -> Result<Vec<u8>, ProtocolError> {
        let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| ProtocolError::InvalidKey(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| ProtocolError::Encryption(format!("nonce unavailable: {e}")))?;
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| ProtocolError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &CipherKey) -> Result<Vec<u8>, ProtocolError> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(ProtocolError::Decryption);
        }
        let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| ProtocolError::InvalidKey(e.to_string()))?;

        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        cipher
            .decrypt(XNonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| ProtocolError::Decryption)
    }
}
