//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional. An invalid value is an error.
//!
//! - `KEYCRAFT_HOST` - Bind address (default: 127.0.0.1)
//! - `KEYCRAFT_PORT` - Listen port (default: 3000)
//! - `KEYCRAFT_DATA_DIR` - Snapshot directory (default: .keycraft)
//! - `KEYCRAFT_PERSIST_DEBOUNCE_MS` - Snapshot write debounce (default: 300)
//! - `KEYCRAFT_AUTH_PATH` - Sign-in entry point for redirects (default: /auth)
//! - `KEYCRAFT_DATABASE_URL` - `PostgreSQL` connection string; enables the
//!   remote wishlist. Falls back to `DATABASE_URL`.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding one snapshot file per storage key
    pub data_dir: PathBuf,
    /// Debounce window for snapshot writes
    pub persist_debounce: Duration,
    /// Where to send users who must sign in
    pub auth_path: String,
    /// `PostgreSQL` connection URL for the remote wishlist (contains password)
    pub database_url: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("persist_debounce", &self.persist_debounce)
            .field("auth_path", &self.auth_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the database URL
    /// looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or_default("KEYCRAFT_HOST", "127.0.0.1")?;
        let port = env.parse_or_default("KEYCRAFT_PORT", "3000")?;
        let data_dir = PathBuf::from(env.or_default("KEYCRAFT_DATA_DIR", ".keycraft"));
        let persist_debounce =
            Duration::from_millis(env.parse_or_default("KEYCRAFT_PERSIST_DEBOUNCE_MS", "300")?);
        let auth_path = env.or_default("KEYCRAFT_AUTH_PATH", "/auth");
        if !auth_path.starts_with('/') {
            return Err(ConfigError::InvalidEnvVar(
                "KEYCRAFT_AUTH_PATH".to_string(),
                "must start with '/'".to_string(),
            ));
        }

        let database_url = env.database_url("KEYCRAFT_DATABASE_URL")?;

        Ok(Self {
            host,
            port,
            data_dir,
            persist_debounce,
            auth_path,
            database_url,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or_default<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<Option<SecretString>, ConfigError> {
        let Some((key, value)) = self
            .optional(primary_key)
            .map(|value| (primary_key, value))
            .or_else(|| self.optional("DATABASE_URL").map(|value| ("DATABASE_URL", value)))
        else {
            return Ok(None);
        };
        let secret = SecretString::from(value);
        validate_not_placeholder(&secret, key)?;
        Ok(Some(secret))
    }
}

/// Reject values that still contain a template placeholder.
fn validate_not_placeholder(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.expose_secret().to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}
