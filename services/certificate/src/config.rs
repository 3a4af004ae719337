//! Centralized configuration for the certificate service.
//!
//! All configuration is loaded from environment variables (optionally seeded
//! from a `.env` file) and validated at startup. Defaults depend on the
//! deployment environment: production stores certificates durably, every
//! other environment uses the ephemeral in-memory store and seeds it.

use crate::error::CertificateError;
use crate::storage::StoreBackend;
use reqwest::Url;
use rust_common::{CircuitBreakerConfig, HttpConfig, RetryConfig, TracingConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production deployment
    Production,
    /// Local development
    Development,
    /// Automated tests
    Test,
}

impl Environment {
    /// Whether this is a production deployment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = CertificateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            _ => Err(CertificateError::config(format!("Invalid APP_ENV: {s}"))),
        }
    }
}

/// Skill service client settings.
#[derive(Debug, Clone)]
pub struct SkillServiceConfig {
    /// Base URL of the skill service
    pub base_url: Url,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Retry policy for transient lookup failures
    pub retry: RetryConfig,
}

/// Message bus settings.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Broker URL
    pub url: String,
    /// Channel certificate events are published on
    pub channel: String,
    /// Upper bound on a single publish, connection included
    pub publish_timeout: Duration,
    /// Breaker settings for the broker
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Certificate service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment
    pub environment: Environment,
    /// Selected storage backend
    pub store: StoreBackend,
    /// Whether to seed an empty store at startup
    pub seed_database: bool,
    /// Skill service client settings
    pub skill_service: SkillServiceConfig,
    /// Message bus settings
    pub bus: BusConfig,
    /// Logging settings
    pub tracing: TracingConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, CertificateError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CertificateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let environment = vars.parse("APP_ENV", Environment::Development)?;
        let production = environment.is_production();

        let store = match vars
            .get("STORE_BACKEND")
            .unwrap_or_else(|| if production { "sqlite" } else { "memory" }.to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => StoreBackend::Sqlite {
                path: PathBuf::from(
                    vars.get("DATABASE_PATH")
                        .unwrap_or_else(|| "certificates.db".to_string()),
                ),
            },
            "memory" | "inmemory" => StoreBackend::InMemory,
            other => {
                return Err(CertificateError::config(format!(
                    "Invalid STORE_BACKEND: {other}"
                )))
            }
        };
        let seed_database = vars.parse("SEED_DATABASE", !production)?;

        let skill_url = vars
            .get("SKILL_SERVICE_URL")
            .unwrap_or_else(|| "http://localhost:6000".to_string());
        let base_url = Url::parse(&skill_url).map_err(|e| {
            CertificateError::config(format!("Invalid SKILL_SERVICE_URL {skill_url}: {e}"))
        })?;
        let skill_service = SkillServiceConfig {
            base_url,
            http: HttpConfig::default()
                .with_timeout(Duration::from_millis(
                    vars.parse("SKILL_SERVICE_TIMEOUT_MS", 5000)?,
                ))
                .with_user_agent("certificate-service/0.1"),
            retry: RetryConfig::default()
                .with_max_retries(vars.parse("SKILL_LOOKUP_MAX_RETRIES", 2)?)
                .with_initial_delay(Duration::from_millis(
                    vars.parse("SKILL_LOOKUP_RETRY_DELAY_MS", 100)?,
                ))
                .with_max_delay(Duration::from_secs(2)),
        };

        let publish_timeout = Duration::from_millis(vars.parse("PUBLISH_TIMEOUT_MS", 2000)?);
        if publish_timeout.is_zero() {
            return Err(CertificateError::config("PUBLISH_TIMEOUT_MS must be positive"));
        }
        let bus = BusConfig {
            url: vars
                .get("BUS_URL")
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            channel: vars
                .get("BUS_CHANNEL")
                .unwrap_or_else(|| "certificates.created".to_string()),
            publish_timeout,
            circuit_breaker: CircuitBreakerConfig::default()
                .with_failure_threshold(vars.parse("BUS_CB_FAILURE_THRESHOLD", 5)?)
                .with_timeout(Duration::from_secs(vars.parse("BUS_CB_TIMEOUT_SECS", 30)?)),
        };

        let tracing = TracingConfig::default()
            .with_service_name("certificate-service")
            .with_log_level(vars.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()))
            .with_json_output(vars.parse("LOG_JSON", production)?);

        Ok(Self {
            environment,
            store,
            seed_database,
            skill_service,
            bus,
            tracing,
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse<T>(&self, name: &str, default: T) -> Result<T, CertificateError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val
                .trim()
                .parse()
                .map_err(|e| CertificateError::config(format!("Invalid {name}: {e}"))),
            None => Ok(default),
        }
    }
}
