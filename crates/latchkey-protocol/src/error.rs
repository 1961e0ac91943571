//! Error types for the protocol layer.
//!
//! Everything in here is a "no usable record" condition for callers on
//! the authentication boundary. The gate maps these to "not
//! authenticated" instead of surfacing them as failures.

/// Errors that can occur while encoding, encrypting, decrypting or
/// decoding session data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a record into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The decrypted plaintext is not a well-formed session record.
    ///
    /// Malformed JSON, missing or unknown fields, wrong types, or a
    /// token that is not lowercase hex all end up here.
    #[cfg(feature = "json")]
    #[error("parse failed: {0}")]
    Parse(serde_json::Error),

    /// The record decoded but violates the record format.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Encryption failed, including failure to draw a fresh nonce.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed: wrong key, truncated input, or tampered
    /// ciphertext. The AEAD tag check does not distinguish between these.
    #[error("decryption failed")]
    Decryption,

    /// Key material could not be used to build a cipher.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A cookie value was not valid URL-safe base64.
    #[error("malformed encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
}

impl ProtocolError {
    /// Returns `true` for errors caused by the data presented rather than
    /// by the local side.
    ///
    /// The gate treats these as "no valid session". Anything else (an
    /// encryption or encode failure) is a fault in this process.
    pub fn is_untrusted_input(&self) -> bool {
        match self {
            #[cfg(feature = "json")]
            Self::Parse(_) => true,
            Self::InvalidRecord(_) | Self::Decryption | Self::Encoding(_) => true,
            _ => false,
        }
    }
}
