use anistore_db::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_DB_PATH: &str = "anistore.db";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Runtime settings, read from `ANISTORE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    /// Insert default rows into empty tables on start.
    pub seed: bool,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            seed: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable source. Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("ANISTORE_DB") {
            config.db_path = path;
        }

        if let Some(value) = get("ANISTORE_SEED") {
            config.seed = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: "ANISTORE_SEED",
                        value,
                    });
                }
            };
        }

        if let Some(value) = get("ANISTORE_MAX_CONNECTIONS") {
            config.max_connections = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "ANISTORE_MAX_CONNECTIONS",
                        value,
                    });
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.db_path, "anistore.db");
        assert!(config.seed);
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ANISTORE_DB", "/var/lib/anistore/records.db"),
            ("ANISTORE_SEED", "off"),
            ("ANISTORE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/var/lib/anistore/records.db");
        assert!(!config.seed);
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn blank_values_fall_back() {
        let config =
            AppConfig::from_lookup(lookup(&[("ANISTORE_DB", "  "), ("ANISTORE_SEED", "")])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("ANISTORE_SEED", "maybe")])),
            Err(ConfigError::InvalidBool {
                var: "ANISTORE_SEED",
                value: "maybe".into()
            })
        );
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("ANISTORE_MAX_CONNECTIONS", "0")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("ANISTORE_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
