//! Session record ⇄ encrypted blob.

use crate::{Cipher, CipherKey, Codec, ProtocolError, SessionRecord};

/// Serializes-then-encrypts a [`SessionRecord`], and the reverse.
///
/// Generic over both collaborators so the format and the cipher can be
/// swapped independently.
#[derive(Debug, Clone, Default)]
pub struct SessionCodec<C, X> {
    codec: C,
    cipher: X,
}

impl<C: Codec, X: Cipher> SessionCodec<C, X> {
    /// Creates a session codec from a serialization codec and a cipher.
    pub fn new(codec: C, cipher: X) -> Self {
        Self { codec, cipher }
    }

    /// Serializes `record` to its canonical form and encrypts it.
    ///
    /// # Errors
    /// `Encode` or `Encryption`. Both are local faults.
    pub fn encode(
        &self,
        record: &SessionRecord,
        key: &CipherKey,
    ) -> Result<Vec<u8>, ProtocolError> {
        let plain = self.codec.encode(record)?;
        self.cipher.encrypt(&plain, key)
    }

    /// Decrypts `blob` and parses the record inside.
    ///
    /// # Errors
    /// - [`ProtocolError::Decryption`]: wrong key or tampered blob
    /// - [`ProtocolError::Parse`] / [`ProtocolError::InvalidRecord`]:
    ///   plaintext is not a well-formed record
    pub fn decode(&self, blob: &[u8], key: &CipherKey) -> Result<SessionRecord, ProtocolError> {
        let plain = self.cipher.decrypt(blob, key)?;
        let record: SessionRecord = self.codec.decode(&plain)?;
        record.validate()?;
        Ok(record)
    }
}
