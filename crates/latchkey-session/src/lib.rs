//! Token issuance and session storage for Latchkey.
//!
//! This crate handles the server-side half of a login:
//!
//! 1. **Issuance**: drawing a fresh random token with an absolute
//!    expiry ([`TokenGenerator`], [`Clock`])
//! 2. **Storage**: keeping the one encrypted session blob per slot on
//!    durable storage ([`SessionStore`], [`FileSessionStore`],
//!    [`MemorySessionStore`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Gate (above)  ← decides when to issue, rotate, or revoke
//!     ↕
//! Session Layer (this crate)  ← makes tokens, holds the encrypted blob
//!     ↕
//! Protocol Layer (below)  ← provides SessionRecord
//! ```
//!
//! The store only ever sees opaque bytes: encryption happens above it.

mod clock;
mod error;
mod file_store;
mod memory_store;
mod store;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;
pub use store::{SessionStore, SlotKey};
pub use token::TokenGenerator;
