use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::workflows::allocation::EligibilityConfig;

/// Distinguishes runtime behavior for different deployment stages.
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

/// Top-level configuration for the `bto` binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: EligibilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("BTO_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("BTO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let log_level = env::var("BTO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("BTO_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Compact,
        };

        let defaults = EligibilityConfig::default();
        let eligibility = EligibilityConfig {
            single_minimum_age: read_number("BTO_SINGLE_MIN_AGE", defaults.single_minimum_age)?,
            married_minimum_age: read_number("BTO_MARRIED_MIN_AGE", defaults.married_minimum_age)?,
            max_officer_slots: read_number("BTO_MAX_OFFICER_SLOTS", defaults.max_officer_slots)?,
            ..defaults
        };
        if eligibility.max_officer_slots == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "BTO_MAX_OFFICER_SLOTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment,
            storage: StorageConfig { data_dir },
            telemetry: TelemetryConfig { log_level, format },
            eligibility,
        })
    }
}

fn read_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

/// Location of the CSV snapshot tables.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Output style for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive whole number (found '{value}')")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "BTO_LOG_FORMAT must be 'compact' or 'pretty' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

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
            "BTO_ENV",
            "BTO_DATA_DIR",
            "BTO_LOG_LEVEL",
            "BTO_LOG_FORMAT",
            "BTO_SINGLE_MIN_AGE",
            "BTO_MARRIED_MIN_AGE",
            "BTO_MAX_OFFICER_SLOTS",
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
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.eligibility, EligibilityConfig::default());
    }

    #[test]
    fn overrides_eligibility_thresholds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BTO_ENV", "production");
        env::set_var("BTO_SINGLE_MIN_AGE", "40");
        env::set_var("BTO_MAX_OFFICER_SLOTS", "4");
        env::set_var("BTO_LOG_FORMAT", "Pretty");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.eligibility.single_minimum_age, 40);
        assert_eq!(config.eligibility.married_minimum_age, 21);
        assert_eq!(config.eligibility.max_officer_slots, 4);
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_non_numeric_age() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BTO_MARRIED_MIN_AGE", "twenty-one");
        let err = AppConfig::load().expect_err("invalid age rejected");
        reset_env();

        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "BTO_MARRIED_MIN_AGE",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_officer_slots() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BTO_MAX_OFFICER_SLOTS", "0");
        let result = AppConfig::load();
        reset_env();

        assert!(result.is_err());
    }
}
