//! Session record format and cryptography for Latchkey.
//!
//! This crate defines what the server keeps about a login and how that
//! data is protected:
//!
//! - **Types** ([`SessionRecord`]): the `{token, expires_at}` pair that
//!   represents the one active login.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a record is turned
//!   into bytes and back.
//! - **Cipher** ([`Cipher`] trait, [`XChaChaCipher`]): authenticated
//!   symmetric encryption, plus [`DerivedKeys`] which splits one
//!   configured secret into one key per purpose.
//! - **Session codec** ([`SessionCodec`]): serialize-then-encrypt for the
//!   stored blob.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Session (store, tokens) → Protocol (record ⇄ encrypted bytes) → Transport (cookies)
//! ```
//!
//! The protocol layer does no I/O. It never sees a file or an HTTP header.

mod cipher;
mod codec;
mod error;
mod session_codec;
mod types;

pub use cipher::{Cipher, CipherKey, DerivedKeys, KeyPurpose, XChaChaCipher};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use session_codec::SessionCodec;
pub use types::{SessionRecord, constant_time_eq};
