//! # Configuration
//!
//! Loaded from environment variables, with a local `.env` file honoured
//! when present.
//!
//! | Variable          | Default        | Meaning                                   |
//! |-------------------|----------------|-------------------------------------------|
//! | `PORT`            | `3000`         | Listen port                               |
//! | `MART_ENV`        | `development`  | `production` hides debug routes and seeding |
//! | `JWT_SECRET`      | dev fallback   | Token signing secret; required in production |
//! | `TOKEN_TTL_HOURS` | `24`           | Identity token lifetime                   |
//! | `MART_SEED_DEMO`  | `true` in dev  | Seed demo users and a store when empty    |
//! | `MART_LOG_FORMAT` | `pretty`       | `json` for structured log lines           |
//! | `DATABASE_URL`    | unset          | Postgres URL; read by [`crate::db::init_pool`] |

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Secret used when `JWT_SECRET` is unset outside production.
const DEVELOPMENT_JWT_SECRET: &str = "mart-development-only-jwt-secret";

/// Shortest `JWT_SECRET` accepted in production.
const MIN_PRODUCTION_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    /// A variable is set but cannot be used.
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development and tests.
    #[default]
    Development,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Whether this is a production deployment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Application configuration.
///
/// `Debug` redacts the signing secret.
#[derive(Clone)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// Token signing secret.
    pub jwt_secret: SecretString,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Seed demo data into an empty user store at startup.
    pub seed_demo: bool,
    /// Log output format.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("seed_demo", &self.seed_demo)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
            jwt_secret: SecretString::from(DEVELOPMENT_JWT_SECRET),
            token_ttl_hours: 24,
            seed_demo: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let environment = match get_env_or_default("MART_ENV", "development").as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "test" => Environment::Development,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "MART_ENV".to_string(),
                    format!("unknown environment \"{other}\""),
                ))
            }
        };

        let port = parse_env("PORT", "3000")?;
        let token_ttl_hours: i64 = parse_env("TOKEN_TTL_HOURS", "24")?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TOKEN_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let jwt_secret = match get_optional_env("JWT_SECRET") {
            Some(secret) => SecretString::from(secret),
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            None => SecretString::from(DEVELOPMENT_JWT_SECRET),
        };
        if environment.is_production()
            && jwt_secret.expose_secret().len() < MIN_PRODUCTION_SECRET_LENGTH
        {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_SECRET".to_string(),
                format!("must be at least {MIN_PRODUCTION_SECRET_LENGTH} characters"),
            ));
        }

        let default_seed = if environment.is_production() { "false" } else { "true" };
        let seed_demo = parse_bool("MART_SEED_DEMO", &get_env_or_default("MART_SEED_DEMO", default_seed))?;

        let log_format = match get_env_or_default("MART_LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            port,
            environment,
            jwt_secret,
            token_ttl_hours,
            seed_demo: seed_demo && !environment.is_production(),
            log_format,
        })
    }

    /// Whether tokens are signed with the built-in development secret.
    ///
    /// Loading runs before logging is set up, so the binary reports this
    /// once tracing is initialised.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == DEVELOPMENT_JWT_SECRET
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got \"{other}\""),
        )),
    }
}
