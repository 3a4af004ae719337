//! Tracing subscriber setup.
//!
//! Services call [`init_tracing`] once at startup. `RUST_LOG` takes precedence
//! over the configured level so operators can raise verbosity per module
//! without a redeploy.

use crate::PlatformError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How a service writes its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Reported once at startup so log streams can be told apart
    pub service_name: String,
    /// Default `EnvFilter` directive, e.g. `info` or `certificate_service=debug`
    pub log_level: String,
    /// One JSON object per event instead of human-readable lines
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Name the service.
    #[must_use]
    pub fn with_service_name(mut self, service: impl Into<String>) -> Self {
        self.service_name = service.into();
        self
    }

    /// Set the default filter directive.
    #[must_use]
    pub fn with_log_level(mut self, directive: impl Into<String>) -> Self {
        self.log_level = directive.into();
        self
    }

    /// Choose JSON or text output.
    #[must_use]
    pub const fn with_json_output(mut self, json: bool) -> Self {
        self.json_output = json;
        self
    }

    fn filter(&self) -> Result<EnvFilter, PlatformError> {
        if let Ok(from_env) = EnvFilter::try_from_default_env() {
            return Ok(from_env);
        }
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| PlatformError::Tracing(format!("bad log level {:?}: {e}", self.log_level)))
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns [`PlatformError::Tracing`] if the level directive does not parse or
/// a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PlatformError> {
    let registry = tracing_subscriber::registry().with(config.filter()?);
    let installed = if config.json_output {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.map_err(|e| PlatformError::Tracing(e.to_string()))?;

    tracing::info!(service = %config.service_name, json = config.json_output, "Tracing initialized");
    Ok(())
}
