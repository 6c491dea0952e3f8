use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidLogLevel { level: String, source: ParseError },
    Install(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidLogLevel { level, .. } => {
                write!(f, "APP_LOG_LEVEL '{level}' is not a valid tracing filter")
            }
            TelemetryError::Install(err) => {
                write!(f, "could not install the scoring log subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidLogLevel { source, .. } => Some(source),
            TelemetryError::Install(err) => Some(&**err),
        }
    }
}

/// Installs the global fmt subscriber for the scoring service.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = log_filter(&config.log_level, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

/// `RUST_LOG` wins when it parses; otherwise the configured level applies.
fn log_filter(configured: &str, rust_log: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }

    EnvFilter::try_new(configured).map_err(|source| TelemetryError::InvalidLogLevel {
        level: configured.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        assert!(log_filter("info", None).is_ok());
        assert!(log_filter("loan_scoring=debug,warn", None).is_ok());
    }

    #[test]
    fn rust_log_takes_precedence_over_configured_level() {
        assert!(log_filter("info", Some("loan_scoring=trace")).is_ok());
    }
}
