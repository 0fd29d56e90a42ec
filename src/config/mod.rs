//! Connection settings resolution.
//!
//! Settings come from an ordered list of [`ConfigProvider`] layers. The first
//! layer that defines a non-blank value for a key wins. The standard stack is:
//!
//! 1. command-line overrides
//! 2. secrets file (`secrets.toml`)
//! 3. process environment (after `.env` is loaded)
//!
//! Resolution reports every missing required key at once.

pub mod providers;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use providers::{ConfigProvider, EnvProvider, OverrideProvider, SecretsFileProvider};

pub const KEY_DRIVER: &str = "DRIVER";
pub const KEY_SERVER: &str = "SERVER";
pub const KEY_DATABASE: &str = "DATABASE";
pub const KEY_UID: &str = "UID";
pub const KEY_PWD: &str = "PWD";
pub const KEY_PORT: &str = "DB_PORT";

/// Keys that must resolve, in reporting order.
pub const REQUIRED_KEYS: [&str; 5] = [KEY_DRIVER, KEY_SERVER, KEY_DATABASE, KEY_UID, KEY_PWD];

pub const DEFAULT_PORT: u16 = 1433;

/// Errors that can occur while resolving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid DB_PORT value '{0}': expected a port number")]
    InvalidPort(String),

    #[error("Failed to read secrets file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse secrets file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

impl ConfigError {
    /// Keys reported missing, empty for other variants.
    pub fn missing_keys(&self) -> &[String] {
        match self {
            Self::Missing(keys) => keys,
            _ => &[],
        }
    }
}

/// Fully resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub driver: String,
    pub server: String,
    pub database: String,
    pub uid: String,
    pub pwd: String,
    pub port: u16,
}

// Keep the password out of debug output and logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("uid", &self.uid)
            .field("pwd", &"***")
            .field("port", &self.port)
            .finish()
    }
}

/// Ordered stack of configuration layers, highest priority first.
#[derive(Default)]
pub struct LayeredConfig {
    providers: Vec<Box<dyn ConfigProvider>>,
}

// Show layer names only; providers may hold secret values.
impl std::fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer below all existing ones.
    pub fn push(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Insert a layer above all existing ones.
    pub fn push_front(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.insert(0, Box::new(provider));
        self
    }

    /// Overrides, then the secrets file, then the environment.
    pub fn standard(
        overrides: OverrideProvider,
        secrets_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let secrets_path = match secrets_path {
            Some(p) => p,
            None => SecretsFileProvider::default_path()?,
        };
        let secrets = SecretsFileProvider::load(&secrets_path)?;
        Ok(Self::new().push(overrides).push(secrets).push(EnvProvider))
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First non-blank value for `key` and the layer it came from.
    pub fn lookup(&self, key: &str) -> Option<(&str, String)> {
        self.providers.iter().find_map(|p| {
            p.lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (p.name(), v))
        })
    }

    /// Resolve all settings or fail with every missing key listed.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let mut found = Vec::with_capacity(REQUIRED_KEYS.len());
        let mut missing = Vec::new();

        for key in REQUIRED_KEYS {
            match self.lookup(key) {
                Some((layer, value)) => {
                    tracing::debug!(key, layer, "resolved setting");
                    // Shells export PWD as the working directory.
                    if key == KEY_PWD && layer == "env" && Path::new(&value).is_dir() {
                        tracing::warn!(
                            "PWD from the environment is a directory path; set the database \
                             password with --pwd or in the secrets file"
                        );
                    }
                    found.push(value);
                }
                None => missing.push(key.to_string()),
            }
        }

        if !missing.is_empty() {
            tracing::debug!(missing = ?missing, "configuration incomplete");
            return Err(ConfigError::Missing(missing));
        }

        let port = match self.lookup(KEY_PORT) {
            Some((layer, raw)) => {
                tracing::debug!(key = KEY_PORT, layer, "resolved setting");
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw.clone()))?
            }
            None => DEFAULT_PORT,
        };

        let mut values = found.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Settings {
            driver: next(),
            server: next(),
            database: next(),
            uid: next(),
            pwd: next(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn layer(label: &str, pairs: &[(&str, &str)]) -> OverrideProvider {
        pairs
            .iter()
            .fold(OverrideProvider::new(label), |acc, (k, v)| acc.with(k, Some(*v)))
    }

    fn full() -> OverrideProvider {
        layer(
            "base",
            &[
                ("DRIVER", "ODBC Driver 18 for SQL Server"),
                ("SERVER", "db.example.net"),
                ("DATABASE", "inventory"),
                ("UID", "reader"),
                ("PWD", "secret"),
            ],
        )
    }

    #[test]
    fn resolves_with_default_port() {
        let settings = LayeredConfig::new().push(full()).resolve().unwrap();
        assert_eq!(settings.server, "db.example.net");
        assert_eq!(settings.database, "inventory");
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn reports_every_missing_key() {
        let config = LayeredConfig::new().push(layer("base", &[("SERVER", "x")]));
        let err = config.resolve().unwrap_err();
        assert_eq!(err.missing_keys(), &["DRIVER", "DATABASE", "UID", "PWD"]);
        let msg = err.to_string();
        assert!(msg.contains("DRIVER, DATABASE, UID, PWD"), "{msg}");
    }

    #[test]
    fn higher_layer_wins() {
        let secrets = SecretsFileProvider::from_values(HashMap::from([(
            "SERVER".to_string(),
            "secret-host".to_string(),
        )]));
        let config = LayeredConfig::new().push(secrets).push(full());
        let settings = config.resolve().unwrap();
        assert_eq!(settings.server, "secret-host");
        assert_eq!(settings.uid, "reader");
    }

    #[test]
    fn push_front_inserts_highest_priority_layer() {
        let config = LayeredConfig::new()
            .push(full())
            .push_front(layer("cli", &[("DATABASE", "staging")]));
        assert_eq!(config.layer_names(), vec!["cli", "base"]);
        assert_eq!(config.resolve().unwrap().database, "staging");
    }

    #[test]
    fn blank_values_fall_through_and_count_as_missing() {
        let config = LayeredConfig::new()
            .push(layer("top", &[("SERVER", "   ")]))
            .push(full());
        assert_eq!(config.resolve().unwrap().server, "db.example.net");

        let only_blank = LayeredConfig::new().push(layer("top", &[("PWD", "")]));
        let err = only_blank.resolve().unwrap_err();
        assert!(err.missing_keys().contains(&"PWD".to_string()));
    }

    #[test]
    fn port_override_and_validation() {
        let config = LayeredConfig::new()
            .push(layer("cli", &[("DB_PORT", "1500")]))
            .push(full());
        assert_eq!(config.resolve().unwrap().port, 1500);

        let bad = LayeredConfig::new()
            .push(layer("cli", &[("DB_PORT", "sql")]))
            .push(full());
        assert!(matches!(bad.resolve(), Err(ConfigError::InvalidPort(p)) if p == "sql"));
    }

    #[test]
    fn missing_required_takes_precedence_over_bad_port() {
        let config = LayeredConfig::new().push(layer("cli", &[("DB_PORT", "nope")]));
        assert!(matches!(config.resolve(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn debug_output_redacts_password() {
        let settings = LayeredConfig::new().push(full()).resolve().unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("***"));
    }
}
