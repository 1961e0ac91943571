//! # Latchkey
//!
//! Single-admin, cookie-carried authentication with rotating tokens.
//!
//! A client proves identity once with credentials and receives an opaque
//! token inside an encrypted cookie. On every later request the token is
//! checked against an encrypted session record and replaced with a fresh
//! one, so each cookie value is good for exactly one validation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use latchkey::prelude::*;
//!
//! # async fn handle(mut exchange: HeaderExchange) -> Result<(), GateError> {
//! let config = GateConfig::load("latchkey.toml")?;
//! let gate = AuthenticationGate::from_config(config)?;
//!
//! let mut ctx = RequestContext::new(&mut exchange);
//! if gate.is_authenticated(&mut ctx).await? {
//!     // serve the admin page; the response now carries a rotated cookie
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod credentials;
mod error;
mod gate;
pub mod telemetry;

pub use config::{ConfigError, GateConfig};
pub use credentials::{Argon2Verifier, CredentialVerifier};
pub use error::GateError;
pub use gate::AuthenticationGate;

/// Everything a request handler needs, in one import.
pub mod prelude {
    pub use crate::{
        Argon2Verifier, AuthenticationGate, ConfigError, CredentialVerifier, GateConfig,
        GateError,
    };
    pub use latchkey_protocol::{ProtocolError, SessionRecord};
    pub use latchkey_session::{
        Clock, FileSessionStore, ManualClock, MemorySessionStore, SessionError, SessionStore,
        SlotKey, SystemClock,
    };
    pub use latchkey_transport::{
        AuthState, CookieAttributes, HeaderExchange, HttpExchange, RequestContext, SetCookie,
    };
}
