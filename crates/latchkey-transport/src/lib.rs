//! Cookie transport for Latchkey.
//!
//! Provides the [`HttpExchange`] trait that abstracts over whatever HTTP
//! stack serves the request, a header-based implementation
//! ([`HeaderExchange`]), and the [`CookieTransport`] that carries an
//! encrypted token between server and client.
//!
//! [`RequestContext`] is the per-request state: it borrows one exchange
//! and caches the decrypted cookie token for the life of that request.

mod context;
mod cookie;
mod exchange;

pub use context::{AuthState, RequestContext};
pub use cookie::{CookieAttributes, CookieTransport, SetCookie};
pub use exchange::{HeaderExchange, HttpExchange};
