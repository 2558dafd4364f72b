//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RECETARIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `RECETARIO_BASE_URL` - Public URL for the site
//! - `RECETARIO_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `RECETARIO_HOST` - Bind address (default: 127.0.0.1)
//! - `RECETARIO_PORT` - Listen port (default: 3000)
//! - `RECETARIO_MEDIA_ROOT` - Directory for uploaded media (default: ./media)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Floor for the session secret length.
const SESSION_SECRET_MIN_LEN: usize = 32;

/// Floor for per-character Shannon entropy of the session secret. Random
/// hex sits around 4 bits/char; English text well under 3.
const SESSION_SECRET_MIN_ENTROPY: f64 = 3.3;

/// Substrings that mark a secret as a placeholder someone forgot to
/// replace (matched case-insensitively).
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Recetario application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` connection URL (contains the password).
    pub database_url: SecretString,
    /// Bind address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Public base URL for the site.
    pub base_url: String,
    /// Session signing secret.
    pub session_secret: SecretString,
    /// Root directory for uploaded media; buckets live below it.
    pub media_root: PathBuf,
    /// Sentry DSN, error tracking disabled when unset.
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag.
    pub sentry_environment: Option<String>,
    /// Sentry tracing sample rate.
    pub sentry_traces_sample_rate: f32,
}

impl SiteConfig {
    /// Load configuration from the environment (and a `.env` file when
    /// one is present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or fails
    /// to parse, or if the session secret looks like a placeholder or
    /// has too little entropy.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = database_url()?;
        let host: IpAddr = parsed("RECETARIO_HOST", "127.0.0.1")?;
        let port: u16 = parsed("RECETARIO_PORT", "3000")?;
        let base_url = required("RECETARIO_BASE_URL")?;
        let session_secret = session_secret("RECETARIO_SESSION_SECRET")?;
        let media_root = PathBuf::from(or_default("RECETARIO_MEDIA_ROOT", "./media"));

        let sentry_dsn = std::env::var("SENTRY_DSN").ok();
        let sentry_environment = std::env::var("SENTRY_ENVIRONMENT").ok();
        let sentry_traces_sample_rate: f32 = parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            media_root,
            sentry_dsn,
            sentry_environment,
            sentry_traces_sample_rate,
        })
    }

    /// The address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parsed<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// The app-specific database variable wins; plain `DATABASE_URL` is
/// accepted so hosting defaults and the sqlx CLI keep working.
fn database_url() -> Result<SecretString, ConfigError> {
    std::env::var("RECETARIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("RECETARIO_DATABASE_URL".to_owned()))
}

/// Load the session secret and refuse weak or placeholder values.
fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

fn check_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < SESSION_SECRET_MIN_LEN {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {SESSION_SECRET_MIN_LEN} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{marker}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < SESSION_SECRET_MIN_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {SESSION_SECRET_MIN_ENTROPY:.1}); use a randomly generated value"
            ),
        ));
    }

    Ok(())
}

/// Shannon entropy of the character distribution, in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)] // secret lengths are tiny
    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            #[allow(clippy::cast_precision_loss)]
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_of_uniform_string_is_zero() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("zzzzzzzz").abs() < f64::EPSILON);
    }

    #[test]
    fn test_entropy_of_two_symbol_string() {
        // Half a, half b: exactly one bit per character.
        assert!((shannon_entropy("abababab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_secret_rejects_short_value() {
        assert!(matches!(
            check_secret_strength("short", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_secret_rejects_placeholder() {
        let err = check_secret_strength("your-session-signing-key-goes-here!!", "TEST_VAR");
        assert!(matches!(err, Err(ConfigError::InsecureSecret(_, msg)) if msg.contains("placeholder")));
    }

    #[test]
    fn test_secret_rejects_low_entropy() {
        let err = check_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(matches!(err, Err(ConfigError::InsecureSecret(_, msg)) if msg.contains("entropy")));
    }

    #[test]
    fn test_secret_accepts_random_value() {
        assert!(check_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6d", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = SiteConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            base_url: "http://localhost:8080".to_owned(),
            session_secret: SecretString::from("x".repeat(40)),
            media_root: PathBuf::from("./media"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }
}
