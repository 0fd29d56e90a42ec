//! Connection descriptor rendering.
//!
//! Turns resolved [`Settings`] into the single connection string used to reach
//! the store. Rendering is pure: no I/O, same input gives the same output.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::form_urlencoded;

use crate::config::{ConfigError, Settings};

/// Fixed connect timeout carried in every descriptor.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEME: &str = "mssql+odbc";

/// Which backend a descriptor points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Embedded SQLite file (driver name contains "sqlite").
    Sqlite { path: PathBuf },
    /// Any other ODBC driver, identified by name.
    Odbc { driver: String },
}

/// Rendered connection descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    settings: Settings,
}

/// Form-url-encode a value the way connection URLs expect (space becomes `+`).
fn quote_plus(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl ConnectionDescriptor {
    /// Build a descriptor, rejecting blank required fields.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let fields = [
            ("DRIVER", &settings.driver),
            ("SERVER", &settings.server),
            ("DATABASE", &settings.database),
            ("UID", &settings.uid),
            ("PWD", &settings.pwd),
        ];
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| (*k).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        Ok(Self {
            settings: settings.clone(),
        })
    }

    pub fn backend(&self) -> Backend {
        if self.settings.driver.to_ascii_lowercase().contains("sqlite") {
            Backend::Sqlite {
                path: PathBuf::from(&self.settings.database),
            }
        } else {
            Backend::Odbc {
                driver: self.settings.driver.clone(),
            }
        }
    }

    fn render(&self, password: &str) -> String {
        let s = &self.settings;
        format!(
            "{SCHEME}://{uid}:{password}@{server}:{port}/{database}\
             ?driver={driver}&Encrypt=yes&TrustServerCertificate=no&Connection+Timeout={timeout}",
            uid = quote_plus(&s.uid),
            server = s.server,
            port = s.port,
            database = s.database,
            driver = quote_plus(&s.driver),
            timeout = CONNECT_TIMEOUT.as_secs(),
        )
    }

    /// The descriptor with the password masked, safe for logs and `dsn` output.
    pub fn redacted(&self) -> String {
        self.render("***")
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&quote_plus(&self.settings.pwd)))
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionDescriptor")
            .field(&self.redacted())
            .finish()
    }
}
