//! The authentication gate: login, per-request validation with token
//! rotation, logout.

use std::io;
use std::time::Duration;

use latchkey_protocol::{
    CipherKey, DerivedKeys, JsonCodec, SessionCodec, SessionRecord, XChaChaCipher,
    constant_time_eq,
};
use latchkey_session::{
    Clock, FileSessionStore, SessionError, SessionStore, SlotKey, SystemClock, TokenGenerator,
};
use latchkey_transport::{
    AuthState, CookieAttributes, CookieTransport, HttpExchange, RequestContext,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, MutexGuard};

use crate::{Argon2Verifier, CredentialVerifier, GateConfig, GateError};

/// Guards the admin area of an application.
///
/// One gate serves every request. Per-request state lives in the
/// [`RequestContext`] passed to each call, so the gate itself is shared
/// freely (`&self` everywhere, `Send + Sync` when its parts are).
///
/// Every successful [`is_authenticated`](Self::is_authenticated) replaces
/// the stored token, so a cookie value validates at most once.
pub struct AuthenticationGate<S = FileSessionStore, V = Argon2Verifier, C = SystemClock> {
    admin_email: String,
    admin_password_hash: SecretString,
    secure_only: bool,
    tokens: TokenGenerator,
    codec: SessionCodec<JsonCodec, XChaChaCipher>,
    session_key: CipherKey,
    cookies: CookieTransport<XChaChaCipher>,
    store: S,
    verifier: V,
    clock: C,
    slot: SlotKey,
    // Serializes load → validate → rotate, and writes against each other.
    rotation: Mutex<()>,
    lock_timeout: Duration,
}

impl AuthenticationGate<FileSessionStore, Argon2Verifier, SystemClock> {
    /// Builds the standard gate: file storage at
    /// `session_storage_location`, Argon2 credentials, wall-clock time.
    ///
    /// # Errors
    /// Returns [`GateError::Config`] if `config` fails validation.
    pub fn from_config(config: GateConfig) -> Result<Self, GateError> {
        let store = FileSessionStore::new(
            config.session_storage_location.clone(),
            config.storage_timeout(),
        );
        Self::new(&config, store, Argon2Verifier, SystemClock)
    }
}

impl<S: SessionStore, V: CredentialVerifier, C: Clock> AuthenticationGate<S, V, C> {
    /// Builds a gate over caller-supplied collaborators.
    ///
    /// # Errors
    /// Returns [`GateError::Config`] if `config` fails validation.
    pub fn new(config: &GateConfig, store: S, verifier: V, clock: C) -> Result<Self, GateError> {
        config.validate()?;
        let keys = DerivedKeys::from_secret(config.secret_key.expose_secret().as_bytes())?;
        let cipher = XChaChaCipher;

        let cookies = CookieTransport::new(
            config.cookie_name.clone(),
            keys.cookie,
            cipher,
            CookieAttributes {
                secure: config.cookie_secure_only,
                http_only: config.cookie_http_only,
            },
            config.token_ttl(),
        );

        Ok(Self {
            admin_email: config.admin_email.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
            secure_only: config.cookie_secure_only,
            tokens: TokenGenerator::new(config.token_length_bytes, config.token_ttl()),
            codec: SessionCodec::new(JsonCodec, cipher),
            session_key: keys.session,
            cookies,
            store,
            verifier,
            clock,
            slot: SlotKey::admin(),
            rotation: Mutex::new(()),
            lock_timeout: config.storage_timeout(),
        })
    }

    /// Uses `slot` instead of the admin slot.
    pub fn with_slot(mut self, slot: SlotKey) -> Self {
        self.slot = slot;
        self
    }

    /// The slot this gate reads and writes.
    pub fn slot(&self) -> &SlotKey {
        &self.slot
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks credentials and, on a match, starts a session.
    ///
    /// Returns `Ok(false)` for any credential mismatch without touching
    /// storage or cookies. The password is verified even when the email
    /// is already wrong.
    ///
    /// # Errors
    /// - [`GateError::PolicyViolation`] if secure-only is configured and
    ///   the request is not secure. Nothing is checked or changed.
    /// - [`GateError::Session`] if no token can be drawn or stored.
    pub async fn authenticate<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
        email: &str,
        password: &str,
    ) -> Result<bool, GateError> {
        if self.secure_only && !ctx.is_secure() {
            tracing::warn!("login refused over an insecure connection");
            return Err(GateError::PolicyViolation);
        }

        let email_ok = constant_time_eq(email.as_bytes(), self.admin_email.as_bytes());
        let password_ok = self
            .verifier
            .verify(password, self.admin_password_hash.expose_secret());
        if !(email_ok & password_ok) {
            tracing::warn!(slot = %self.slot, "login failed: invalid credentials");
            return Ok(false);
        }

        let now = self.clock.now();
        let record = self.tokens.dispense(&self.clock)?;
        let blob = self.codec.encode(&record, &self.session_key)?;
        let sealed = self.cookies.encode(&record.token)?;
        {
            let _guard = self.lock_rotation().await?;
            self.store.persist(&self.slot, blob).await.inspect_err(|e| {
                tracing::warn!(slot = %self.slot, error = %e, "failed to store new session");
            })?;
        }

        self.cookies.set_sealed(ctx, &record.token, sealed, now);
        ctx.set_state(AuthState::Authenticated);
        tracing::info!(slot = %self.slot, expires_at = record.expires_at, "admin logged in");
        Ok(true)
    }

    /// Validates the request's cookie and rotates the token on success.
    ///
    /// `Ok(false)` covers every data-driven rejection: no cookie, a cookie
    /// that doesn't decrypt, no stored session, a tampered or malformed
    /// record, a token mismatch, an expired record, and losing a rotation
    /// race to a concurrent request. None of these change storage.
    ///
    /// # Errors
    /// [`GateError::Session`] on storage faults or randomness failure.
    /// The request is not authenticated in that case either.
    pub async fn is_authenticated<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
    ) -> Result<bool, GateError> {
        let outcome = self.validate_and_rotate(ctx).await;
        let state = match outcome {
            Ok(true) => AuthState::Authenticated,
            _ => AuthState::Anonymous,
        };
        ctx.set_state(state);
        outcome
    }

    async fn validate_and_rotate<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
    ) -> Result<bool, GateError> {
        let token = self.cookies.cookie_token(ctx);
        if token.is_empty() {
            tracing::debug!(cookie = self.cookies.name(), "no usable auth cookie");
            return Ok(false);
        }

        let guard = self.lock_rotation().await?;

        let blob = match self.store.load(&self.slot).await {
            Ok(blob) => blob,
            Err(SessionError::NotFound(_)) => {
                tracing::debug!(slot = %self.slot, "no stored session");
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "failed to load session");
                return Err(e.into());
            }
        };

        let record = match self.codec.decode(&blob, &self.session_key) {
            Ok(record) => record,
            Err(e) if e.is_untrusted_input() => {
                tracing::debug!(slot = %self.slot, error = %e, "stored session is unreadable");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now();
        if !record.accepts(&token, now) {
            let reason = if record.is_live_at(now) {
                "token mismatch"
            } else {
                "session expired"
            };
            tracing::debug!(slot = %self.slot, reason, "session rejected");
            return Ok(false);
        }

        // Everything that can fail locally happens before the swap commits.
        let next = self.tokens.dispense(&self.clock)?;
        let next_blob = self.codec.encode(&next, &self.session_key)?;
        let sealed = self.cookies.encode(&next.token)?;
        let swapped = self
            .store
            .compare_and_swap(&self.slot, &blob, next_blob)
            .await
            .inspect_err(|e| {
                tracing::warn!(slot = %self.slot, error = %e, "failed to rotate session");
            })?;
        drop(guard);

        if !swapped {
            tracing::debug!(slot = %self.slot, "session rotated by a concurrent request");
            return Ok(false);
        }

        self.cookies.set_sealed(ctx, &next.token, sealed, now);
        tracing::info!(slot = %self.slot, expires_at = next.expires_at, "session token rotated");
        Ok(true)
    }

    /// Ends the session: clears the client cookie and deletes the stored
    /// record. Succeeds when there is no session.
    ///
    /// The cookie is cleared before storage is touched, so the client is
    /// logged out even if the delete fails.
    ///
    /// # Errors
    /// [`GateError::Session`] if the stored record could not be removed.
    pub async fn logout<H: HttpExchange>(
        &self,
        ctx: &mut RequestContext<'_, H>,
    ) -> Result<(), GateError> {
        self.cookies.clear(ctx, self.clock.now());
        ctx.set_state(AuthState::Anonymous);

        let _guard = self.lock_rotation().await?;
        self.store.delete(&self.slot).await.inspect_err(|e| {
            tracing::warn!(slot = %self.slot, error = %e, "failed to delete session");
        })?;
        tracing::info!(slot = %self.slot, "admin logged out");
        Ok(())
    }

    /// The token carried by this request's cookie, empty if none.
    pub fn cookie_token<H: HttpExchange>(&self, ctx: &mut RequestContext<'_, H>) -> String {
        self.cookies.cookie_token(ctx)
    }

    /// The stored record, decrypted. `None` if the slot is empty,
    /// unreadable, or storage fails.
    pub async fn current_record(&self) -> Option<SessionRecord> {
        let blob = self.store.load(&self.slot).await.ok()?;
        self.codec.decode(&blob, &self.session_key).ok()
    }

    async fn lock_rotation(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        tokio::time::timeout(self.lock_timeout, self.rotation.lock())
            .await
            .map_err(|_| {
                SessionError::StorageUnavailable(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out waiting for the session lock",
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use latchkey_session::{ManualClock, MemorySessionStore};
    use latchkey_transport::HeaderExchange;

    /// Accepts the password equal to the stored "hash".
    struct PlainVerifier;

    impl CredentialVerifier for PlainVerifier {
        fn verify(&self, password: &str, stored_hash: &str) -> bool {
            password == stored_hash
        }
    }

    type TestGate = AuthenticationGate<Arc<MemorySessionStore>, PlainVerifier, Arc<ManualClock>>;

    fn config() -> GateConfig {
        GateConfig {
            token_length_bytes: 16,
            token_ttl_seconds: 3600,
            secret_key: SecretString::from("unit-test-secret".to_string()),
            cookie_name: "auth".into(),
            admin_email: "admin@x.com".into(),
            admin_password_hash: SecretString::from("secret".to_string()),
            ..GateConfig::default()
        }
    }

    fn gate() -> (TestGate, Arc<MemorySessionStore>, Arc<ManualClock>) {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let gate = AuthenticationGate::new(&config(), store.clone(), PlainVerifier, clock.clone())
            .unwrap();
        (gate, store, clock)
    }

    #[test]
    fn test_new_invalid_config_returns_config_error() {
        let bad = GateConfig {
            cookie_name: "has space".into(),
            ..config()
        };
        let result = AuthenticationGate::new(
            &bad,
            MemorySessionStore::new(),
            PlainVerifier,
            ManualClock::new(0),
        );
        assert!(matches!(result, Err(GateError::Config(_))));
    }

    #[tokio::test]
    async fn test_authenticate_success_sets_state_and_cookie() {
        let (gate, _store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        assert!(gate.authenticate(&mut ctx, "admin@x.com", "secret").await.unwrap());
        assert_eq!(ctx.state(), AuthState::Authenticated);

        let token = gate.cookie_token(&mut ctx);
        assert_eq!(token.len(), 32);
        assert_eq!(gate.current_record().await.unwrap().token, token);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_email_returns_false() {
        let (gate, store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        assert!(!gate.authenticate(&mut ctx, "root@x.com", "secret").await.unwrap());
        assert_eq!(ctx.state(), AuthState::Anonymous);
        assert!(store.is_empty().await);
        assert!(ex.set_cookies().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_insecure_returns_policy_violation() {
        let (gate, store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, false);
        let mut ctx = RequestContext::new(&mut ex);

        let result = gate.authenticate(&mut ctx, "admin@x.com", "secret").await;
        assert!(matches!(result, Err(GateError::PolicyViolation)));
        assert!(store.is_empty().await);
        assert!(ex.set_cookies().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_insecure_allowed_when_not_secure_only() {
        let store = Arc::new(MemorySessionStore::new());
        let relaxed = GateConfig {
            cookie_secure_only: false,
            ..config()
        };
        let gate =
            AuthenticationGate::new(&relaxed, store, PlainVerifier, ManualClock::new(0)).unwrap();
        let mut ex = HeaderExchange::new(None, false);
        let mut ctx = RequestContext::new(&mut ex);

        assert!(gate.authenticate(&mut ctx, "admin@x.com", "secret").await.unwrap());
        assert!(!ex.set_cookies()[0].secure);
    }

    #[tokio::test]
    async fn test_is_authenticated_without_cookie_returns_false() {
        let (gate, _store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        assert!(!gate.is_authenticated(&mut ctx).await.unwrap());
        assert_eq!(ctx.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_is_authenticated_same_request_after_login_rotates() {
        let (gate, _store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        gate.authenticate(&mut ctx, "admin@x.com", "secret").await.unwrap();
        let first = gate.cookie_token(&mut ctx);
        assert!(gate.is_authenticated(&mut ctx).await.unwrap());
        let second = gate.cookie_token(&mut ctx);

        assert_ne!(first, second);
        assert_eq!(gate.current_record().await.unwrap().token, second);
    }

    #[tokio::test]
    async fn test_is_authenticated_expired_leaves_record() {
        let (gate, _store, clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        {
            let mut ctx = RequestContext::new(&mut ex);
            gate.authenticate(&mut ctx, "admin@x.com", "secret").await.unwrap();
        }
        let before = gate.current_record().await.unwrap();

        clock.advance(3600);
        let mut next = ex.next_request("auth");
        let mut ctx = RequestContext::new(&mut next);
        assert!(!gate.is_authenticated(&mut ctx).await.unwrap());
        assert_eq!(gate.current_record().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        let (gate, _store, _clock) = gate();
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        gate.logout(&mut ctx).await.unwrap();
        gate.logout(&mut ctx).await.unwrap();
        assert_eq!(gate.cookie_token(&mut ctx), "");
    }

    #[tokio::test]
    async fn test_with_slot_uses_named_slot() {
        let (gate, store, _clock) = gate();
        let gate = gate.with_slot(SlotKey::new("editor").unwrap());
        assert_eq!(gate.slot().as_str(), "editor");
        let mut ex = HeaderExchange::new(None, true);
        let mut ctx = RequestContext::new(&mut ex);

        gate.authenticate(&mut ctx, "admin@x.com", "secret").await.unwrap();
        assert!(store.load(&SlotKey::new("editor").unwrap()).await.is_ok());
        assert!(matches!(
            store.load(&SlotKey::admin()).await,
            Err(SessionError::NotFound(_))
        ));
    }
}
