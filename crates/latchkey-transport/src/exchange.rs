//! The HTTP seam.

use crate::SetCookie;

/// What the gate needs from the HTTP layer for one request.
///
/// Implement this for the request/response types of your web framework.
/// [`HeaderExchange`] is a framework-free implementation over raw
/// header strings.
pub trait HttpExchange {
    /// The value of the incoming cookie `name`, if the client sent one.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Whether the request arrived over a secure transport (TLS, or a
    /// trusted proxy that terminated TLS).
    fn is_secure(&self) -> bool;

    /// Queues a `Set-Cookie` on the response.
    fn set_cookie(&mut self, cookie: SetCookie);
}

// ---------------------------------------------------------------------------
// HeaderExchange
// ---------------------------------------------------------------------------

/// An [`HttpExchange`] built from a raw `Cookie:` request header.
///
/// Outgoing cookies are collected in order; render them with
/// [`set_cookie_headers`](Self::set_cookie_headers).
#[derive(Debug, Clone, Default)]
pub struct HeaderExchange {
    cookie_header: Option<String>,
    secure: bool,
    set_cookies: Vec<SetCookie>,
}

impl HeaderExchange {
    /// Creates an exchange for a request with the given `Cookie` header.
    pub fn new(cookie_header: Option<&str>, secure: bool) -> Self {
        Self {
            cookie_header: cookie_header.map(str::to_string),
            secure,
            set_cookies: Vec::new(),
        }
    }

    /// A request carrying exactly one cookie.
    pub fn with_cookie(name: &str, value: &str, secure: bool) -> Self {
        Self::new(Some(&format!("{name}={value}")), secure)
    }

    /// The cookies queued on the response, oldest first.
    pub fn set_cookies(&self) -> &[SetCookie] {
        &self.set_cookies
    }

    /// The queued cookies rendered as `Set-Cookie` header values.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.set_cookies
            .iter()
            .map(SetCookie::to_header_value)
            .collect()
    }

    /// The value `name` would hold in the client after this response:
    /// the last queued value wins.
    pub fn response_cookie(&self, name: &str) -> Option<&str> {
        self.set_cookies
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Builds the next request a browser would send after this response,
    /// for cookie `name`.
    ///
    /// If the response set `name`, the new request carries that value
    /// (an empty value means the cookie was cleared, so none is sent).
    /// Otherwise the incoming cookie is carried over unchanged.
    pub fn next_request(&self, name: &str) -> Self {
        let value = match self.response_cookie(name) {
            Some(v) => Some(v),
            None => self.cookie(name),
        };
        match value {
            Some(v) if !v.is_empty() => Self::with_cookie(name, v, self.secure),
            _ => Self::new(None, self.secure),
        }
    }
}

impl HttpExchange for HeaderExchange {
    fn cookie(&self, name: &str) -> Option<&str> {
        let header = self.cookie_header.as_deref()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn set_cookie(&mut self, cookie: SetCookie) {
        self.set_cookies.push(cookie);
    }
}
