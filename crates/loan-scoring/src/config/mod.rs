use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::scoring::{ForestSettings, TrainingSettings};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the model artifact and decision history live, and how training behaves.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub model_path: PathBuf,
    pub history_path: PathBuf,
    pub training: TrainingSettings,
}

impl ScoringConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = TrainingSettings::default();

        let model_path = env::var("SCORING_MODEL_PATH")
            .unwrap_or_else(|_| "loan_approval_model.json".to_string());
        let history_path = env::var("SCORING_HISTORY_PATH")
            .unwrap_or_else(|_| "loan_applications.csv".to_string());

        let min_decided_records =
            parse_var("SCORING_MIN_TRAINING_RECORDS", defaults.min_decided_records)?;
        let n_estimators = parse_var("SCORING_FOREST_TREES", defaults.forest.n_estimators)?;
        if n_estimators == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "SCORING_FOREST_TREES",
                expected: "a positive integer",
            });
        }
        let random_state = parse_var("SCORING_FOREST_SEED", defaults.forest.random_state)?;

        Ok(Self {
            model_path: PathBuf::from(model_path),
            history_path: PathBuf::from(history_path),
            training: TrainingSettings {
                min_decided_records,
                forest: ForestSettings {
                    n_estimators,
                    random_state,
                    ..defaults.forest
                },
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber {
                key,
                expected: "a non-negative integer",
            }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber {
        key: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, expected } => {
                write!(f, "{key} must be {expected}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SCORING_MODEL_PATH",
            "SCORING_HISTORY_PATH",
            "SCORING_MIN_TRAINING_RECORDS",
            "SCORING_FOREST_TREES",
            "SCORING_FOREST_SEED",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(
            config.scoring.model_path,
            PathBuf::from("loan_approval_model.json")
        );
        assert_eq!(config.scoring.training.min_decided_records, 10);
        assert_eq!(config.scoring.training.forest.n_estimators, 50);
        assert_eq!(config.scoring.training.forest.random_state, 42);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn scoring_overrides_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORING_MIN_TRAINING_RECORDS", "25");
        env::set_var("SCORING_FOREST_TREES", " 8 ");
        env::set_var("SCORING_HISTORY_PATH", "/var/lib/loans/history.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scoring.training.min_decided_records, 25);
        assert_eq!(config.scoring.training.forest.n_estimators, 8);
        assert_eq!(
            config.scoring.history_path,
            PathBuf::from("/var/lib/loans/history.csv")
        );
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_training_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORING_MIN_TRAINING_RECORDS", "ten");
        let err = AppConfig::load().expect_err("threshold must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "SCORING_MIN_TRAINING_RECORDS",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn rejects_forest_without_trees() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORING_FOREST_TREES", "0");
        let err = AppConfig::load().expect_err("a forest needs at least one tree");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "SCORING_FOREST_TREES",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "SCORING_FOREST_TREES must be a positive integer"
        );
        reset_env();
    }
}
