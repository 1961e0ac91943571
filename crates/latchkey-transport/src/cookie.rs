//! Encrypted token cookies.
//!
//! The cookie never holds the raw token. It holds
//! `base64url(nonce || XChaCha20-Poly1305(token))` under the cookie key,
//! which is a different key from the one protecting the stored record.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use latchkey_protocol::{Cipher, CipherKey, ProtocolError};

use crate::{HttpExchange, RequestContext};

/// How far in the past a logout cookie's expiry is set.
const CLEAR_BACKDATE_SECS: i64 = 3600;

/// IMF-fixdate, the `Expires` format browsers expect.
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// ---------------------------------------------------------------------------
// SetCookie
// ---------------------------------------------------------------------------

/// Client-side cookie flags, taken straight from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Send only over HTTPS.
    pub secure: bool,
    /// Hide from client-side scripts.
    pub http_only: bool,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            secure: true,
            http_only: true,
        }
    }
}

/// One outgoing `Set-Cookie`.
///
/// Path is always `/` and domain always empty (host-only cookie).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// Absolute expiry, unix seconds.
    pub expires_at: i64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SetCookie {
    /// Builds a cookie with the fixed path and domain.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        expires_at: i64,
        attributes: CookieAttributes,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires_at,
            path: "/".to_string(),
            domain: String::new(),
            secure: attributes.secure,
            http_only: attributes.http_only,
        }
    }

    /// Renders the `Set-Cookie` header value.
    ///
    /// `Domain` is omitted when empty. `Expires` is omitted if the
    /// timestamp can't be represented as a calendar date.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(when) = DateTime::<Utc>::from_timestamp(self.expires_at, 0) {
            out.push_str("; Expires=");
            out.push_str(&when.format(EXPIRES_FORMAT).to_string());
        }
        out.push_str("; Path=");
        out.push_str(&self.path);
        if !self.domain.is_empty() {
            out.push_str("; Domain=");
            out.push_str(&self.domain);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

// ---------------------------------------------------------------------------
// CookieTransport
// ---------------------------------------------------------------------------

/// Carries the session token to and from the client in an encrypted
/// cookie.
#[derive(Debug, Clone)]
pub struct CookieTransport<X> {
    name: String,
    key: CipherKey,
    cipher: X,
    attributes: CookieAttributes,
    ttl_secs: i64,
}

impl<X: Cipher> CookieTransport<X> {
    /// Creates a transport for cookie `name`.
    ///
    /// `ttl` is the client-side lifetime set on issuance and rotation.
    pub fn new(
        name: impl Into<String>,
        key: CipherKey,
        cipher: X,
        attributes: CookieAttributes,
        ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            key,
            cipher,
            attributes,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// The cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encrypts `token` into a cookie value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encryption`] if the cipher fails.
    pub fn encode(&self, token: &str) -> Result<String, ProtocolError> {
        let sealed = self.cipher.encrypt(token.as_bytes(), &self.key)?;
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypts a cookie value back into a token.
    ///
    /// Never fails: a missing cookie, bad base64, a failed decryption or
    /// non-UTF-8 plaintext all yield the empty token, which matches no
    /// session.
    pub fn decode(&self, value: Option<&str>) -> String {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return String::new();
        };
        match self.try_decode(value) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(cookie = %self.name, error = %e, "rejecting auth cookie");
                String::new()
            }
        }
    }

    fn try_decode(&self, value: &str) -> Result<String, ProtocolError> {
        let sealed = URL_SAFE_NO_PAD.decode(value)?;
        let plain = self.cipher.decrypt(&sealed, &self.key)?;
        String::from_utf8(plain).map_err(|_| ProtocolError::Decryption)
    }

    /// The token carried by this request's cookie, empty if none.
    ///
    /// Decrypted on first call and cached in `ctx`; later calls in the
    /// same request return the cached value (including a token set by
    /// [`set_token`](Self::set_token) earlier in the request).
    pub fn cookie_token<H: HttpExchange>(&self, ctx: &mut RequestContext<'_, H>) -> String {
        if let Some(cached) = ctx.cached_token() {
            return cached.to_string();
        }
        let token = self.decode(ctx.http().cookie(&self.name));
        ctx.cache_token(token.clone());
        token
    }

    /// Sends `token` to the client, expiring `ttl` after `now`, and
    /// remembers it for the rest of the request.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encryption`] if the cipher fails; no
    /// cookie is set in that case.
    pub fn set_token<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
        token: &str,
        now: i64,
    ) -> Result<(), ProtocolError> {
        let value = self.encode(token)?;
        self.set_sealed(ctx, token, value, now);
        Ok(())
    }

    /// Like [`set_token`](Self::set_token) for a value already produced
    /// by [`encode`](Self::encode) from `token`. Cannot fail.
    pub fn set_sealed<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
        token: &str,
        sealed: String,
        now: i64,
    ) {
        let expires_at = now.saturating_add(self.ttl_secs);
        ctx.http_mut()
            .set_cookie(SetCookie::new(&self.name, sealed, expires_at, self.attributes));
        ctx.cache_token(token.to_string());
    }

    /// Clears the client cookie: empty value, expiry an hour before `now`.
    pub fn clear<H: HttpExchange>(&self, ctx: &mut RequestContext<'_, H>, now: i64) {
        let expires_at = now.saturating_sub(CLEAR_BACKDATE_SECS);
        ctx.http_mut()
            .set_cookie(SetCookie::new(&self.name, "", expires_at, self.attributes));
        ctx.cache_token(String::new());
    }
}
