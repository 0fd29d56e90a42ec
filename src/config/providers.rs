//! Lookup layers for connection settings.
//!
//! Each provider answers "what is the value of KEY?" for one source. The
//! resolver in [`super::LayeredConfig`] asks them in priority order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// A single configuration layer.
pub trait ConfigProvider: Send + Sync {
    /// Short label used in logs (`"env"`, `"secrets"`, ...).
    fn name(&self) -> &str;

    /// Raw value for `key`, if this layer defines it.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Process environment, including anything `main` loaded from `.env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvProvider;

impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        dotenvy::var(key).ok()
    }
}

/// Explicit key/value pairs, typically from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct OverrideProvider {
    label: String,
    values: HashMap<String, String>,
}

impl OverrideProvider {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: HashMap::new(),
        }
    }

    /// Set `key` when `value` is present; `None` leaves the layer untouched.
    pub fn with(mut self, key: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(v) = value {
            self.values.insert(key.to_string(), v.into());
        }
        self
    }
}

impl ConfigProvider for OverrideProvider {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Secret store backed by a flat TOML file:
///
/// ```toml
/// SERVER = "inventory.example.net"
/// PWD = "s3cret"
/// DB_PORT = 1433
/// ```
#[derive(Debug, Default, Clone)]
pub struct SecretsFileProvider {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl SecretsFileProvider {
    /// Load secrets from `path`. A missing file is an empty layer.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "secrets file not found, skipping layer");
            return Ok(Self {
                path: Some(path.to_path_buf()),
                values: HashMap::new(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map(|values| Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Parse the TOML body. Scalars are accepted as strings, integers or
    /// booleans; nested tables are ignored.
    pub fn parse(content: &str) -> Result<HashMap<String, String>, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut values = HashMap::new();
        for (key, value) in table {
            let rendered = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                _ => continue,
            };
            values.insert(key, rendered);
        }
        Ok(values)
    }

    pub fn from_values(values: HashMap<String, String>) -> Self {
        Self { path: None, values }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Default secrets location.
    ///
    /// - `INVDASH_SECRETS` if set
    /// - `$XDG_CONFIG_HOME/invdash/secrets.toml`
    /// - platform config dir (e.g. `~/.config/invdash/secrets.toml` on Linux)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(explicit) = dotenvy::var("INVDASH_SECRETS") {
            return Ok(PathBuf::from(explicit));
        }
        if let Ok(xdg_config) = dotenvy::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config)
                .join("invdash")
                .join("secrets.toml"));
        }
        dirs::config_dir()
            .map(|p| p.join("invdash").join("secrets.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }
}

impl ConfigProvider for SecretsFileProvider {
    fn name(&self) -> &str {
        "secrets"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
