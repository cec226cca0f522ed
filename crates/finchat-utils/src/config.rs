//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, etc.)
    pub environment: String,
    /// Emit JSON log lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "finchat".to_string(),
            environment: "development".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Read configuration from the environment
    ///
    /// `APP_ENV` selects the environment and `LOG_FORMAT=json` switches the
    /// log format. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            app_name: defaults.app_name,
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.app_name, "finchat");
        assert_eq!(config.environment, "development");
        assert!(!config.json_logs);
        assert!(!config.is_production());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(|key| match key {
            "APP_ENV" => Some("production".to_string()),
            "LOG_FORMAT" => Some("JSON".to_string()),
            _ => None,
        });
        assert!(config.json_logs);
        assert!(config.is_production());
    }

    #[test]
    fn test_serializes() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["app_name"], "finchat");
    }
}
