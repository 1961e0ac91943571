//! Gate configuration.
//!
//! Loaded once from TOML, optionally overridden from the environment for
//! the two secrets, validated, and read-only afterwards.
//!
//! ```toml
//! token_length_bytes = 32
//! token_ttl_seconds = 1200
//! secret_key = "change me"
//! session_storage_location = "/var/lib/app/session.dat"
//! cookie_name = "latchkey_auth"
//! cookie_secure_only = true
//! cookie_http_only = true
//! admin_email = "admin@example.com"
//! admin_password_hash = "$argon2id$v=19$..."
//! storage_timeout_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Overrides `secret_key` when set.
pub const SECRET_KEY_ENV: &str = "LATCHKEY_SECRET_KEY";

/// Overrides `admin_password_hash` when set.
pub const ADMIN_PASSWORD_HASH_ENV: &str = "LATCHKEY_ADMIN_PASSWORD_HASH";

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or missing.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// GateConfig
// ---------------------------------------------------------------------------

/// Everything the gate needs to know about its deployment.
///
/// `Debug` never prints the secret key or the password hash.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Random bytes per token. The token string is twice as long.
    pub token_length_bytes: usize,

    /// Lifetime of a token, and of the cookie carrying it.
    pub token_ttl_seconds: u64,

    /// Master secret. Per-purpose keys are derived from it.
    pub secret_key: SecretString,

    /// File holding the encrypted session record.
    pub session_storage_location: PathBuf,

    /// Name of the auth cookie.
    pub cookie_name: String,

    /// Mark the cookie `Secure`, and refuse logins over plain HTTP.
    pub cookie_secure_only: bool,

    /// Mark the cookie `HttpOnly`.
    pub cookie_http_only: bool,

    /// The one administrator identity.
    pub admin_email: String,

    /// PHC-format hash of the administrator password.
    pub admin_password_hash: SecretString,

    /// Upper bound for each storage operation, in milliseconds.
    pub storage_timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            token_length_bytes: 32,
            token_ttl_seconds: 1200,
            secret_key: SecretString::default(),
            session_storage_location: PathBuf::from("session.dat"),
            cookie_name: "latchkey_auth".to_string(),
            cookie_secure_only: true,
            cookie_http_only: true,
            admin_email: String::new(),
            admin_password_hash: SecretString::default(),
            storage_timeout_ms: 2000,
        }
    }
}

/// On-disk shape. Secrets arrive as plain strings and are wrapped
/// immediately.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    token_length_bytes: usize,
    token_ttl_seconds: u64,
    secret_key: String,
    session_storage_location: PathBuf,
    cookie_name: String,
    cookie_secure_only: bool,
    cookie_http_only: bool,
    admin_email: String,
    admin_password_hash: String,
    storage_timeout_ms: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        let d = GateConfig::default();
        Self {
            token_length_bytes: d.token_length_bytes,
            token_ttl_seconds: d.token_ttl_seconds,
            secret_key: String::new(),
            session_storage_location: d.session_storage_location,
            cookie_name: d.cookie_name,
            cookie_secure_only: d.cookie_secure_only,
            cookie_http_only: d.cookie_http_only,
            admin_email: d.admin_email,
            admin_password_hash: String::new(),
            storage_timeout_ms: d.storage_timeout_ms,
        }
    }
}

impl From<RawConfig> for GateConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            token_length_bytes: raw.token_length_bytes,
            token_ttl_seconds: raw.token_ttl_seconds,
            secret_key: SecretString::from(raw.secret_key),
            session_storage_location: raw.session_storage_location,
            cookie_name: raw.cookie_name,
            cookie_secure_only: raw.cookie_secure_only,
            cookie_http_only: raw.cookie_http_only,
            admin_email: raw.admin_email,
            admin_password_hash: SecretString::from(raw.admin_password_hash),
            storage_timeout_ms: raw.storage_timeout_ms,
        }
    }
}

impl GateConfig {
    /// Parses TOML. Missing keys take their defaults. Not validated.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(input)?;
        Ok(raw.into())
    }

    /// Reads `path`, applies environment overrides, and validates.
    ///
    /// # Errors
    /// [`ConfigError::Read`], [`ConfigError::Parse`] or
    /// [`ConfigError::Invalid`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env();
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded gate config");
        Ok(config)
    }

    /// Replaces the secrets with [`SECRET_KEY_ENV`] and
    /// [`ADMIN_PASSWORD_HASH_ENV`] when those are set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup(SECRET_KEY_ENV).filter(|v| !v.is_empty()) {
            self.secret_key = SecretString::from(secret);
        }
        if let Some(hash) = lookup(ADMIN_PASSWORD_HASH_ENV).filter(|v| !v.is_empty()) {
            self.admin_password_hash = SecretString::from(hash);
        }
    }

    /// Checks every value the gate depends on.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.token_length_bytes == 0 {
            return invalid("token_length_bytes must be at least 1");
        }
        if self.token_ttl_seconds == 0 {
            return invalid("token_ttl_seconds must be at least 1");
        }
        if self.secret_key.expose_secret().is_empty() {
            return invalid("secret_key is empty");
        }
        if self.session_storage_location.as_os_str().is_empty() {
            return invalid("session_storage_location is empty");
        }
        if self.cookie_name.is_empty() {
            return invalid("cookie_name is empty");
        }
        if self
            .cookie_name
            .chars()
            .any(|c| c == '=' || c == ';' || c == ',' || c.is_whitespace() || c.is_control())
        {
            return invalid("cookie_name contains a separator or whitespace");
        }
        if self.admin_email.is_empty() {
            return invalid("admin_email is empty");
        }
        if self.admin_password_hash.expose_secret().is_empty() {
            return invalid("admin_password_hash is empty");
        }
        if self.storage_timeout_ms == 0 {
            return invalid("storage_timeout_ms must be at least 1");
        }
        Ok(())
    }

    /// Token lifetime as a `Duration`.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    /// Storage timeout as a `Duration`.
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}
