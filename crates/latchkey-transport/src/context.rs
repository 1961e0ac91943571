//! Per-request state.

use crate::HttpExchange;

/// Where the current request stands.
///
/// ```text
///   Anonymous ──(authenticate ok / is_authenticated ok)──→ Authenticated
///       ↑                                                       │
///       └──────(logout / failed validation)─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No valid session has been shown in this request.
    #[default]
    Anonymous,
    /// The request logged in or presented a valid, now rotated, token.
    Authenticated,
}

/// State that lives exactly as long as one request.
///
/// Borrows the request's [`HttpExchange`] mutably, so a context can't
/// outlive its request or be shared with another one. The decrypted
/// cookie token is cached here: decrypting happens at most once per
/// request no matter how often the token is asked for.
#[derive(Debug)]
pub struct RequestContext<'a, H: HttpExchange> {
    http: &'a mut H,
    token: Option<String>,
    state: AuthState,
}

impl<'a, H: HttpExchange> RequestContext<'a, H> {
    /// Starts the context for one request.
    pub fn new(http: &'a mut H) -> Self {
        Self {
            http,
            token: None,
            state: AuthState::Anonymous,
        }
    }

    /// The underlying exchange.
    pub fn http(&self) -> &H {
        &*self.http
    }

    /// The underlying exchange, mutably.
    pub fn http_mut(&mut self) -> &mut H {
        &mut *self.http
    }

    /// Whether the request arrived over a secure transport.
    pub fn is_secure(&self) -> bool {
        self.http.is_secure()
    }

    /// The auth state reached so far in this request.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Records the auth state. Used by the gate.
    pub fn set_state(&mut self, state: AuthState) {
        self.state = state;
    }

    /// The cached cookie token, if it was decoded or set in this request.
    pub fn cached_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn cache_token(&mut self, token: String) {
        self.token = Some(token);
    }
}
