//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl ConnectionConfig {
    /// Build an ODBC connection string, applying defaults for blank fields.
    pub fn connection_string(&self) -> String {
        let mut conn_str = format!(
            "Driver={{{}}};Server={};Database={};",
            self.driver_or_default(),
            self.host_or_default(),
            self.database_or_default()
        );

        if self.uses_sql_auth() {
            conn_str.push_str(&format!("UID={};PWD={{{}}};", self.user, escape_braced(&self.password)));
        } else {
            conn_str.push_str("Trusted_Connection=yes;");
        }

        conn_str
    }

    /// Connection string with the password hidden, for logging.
    pub fn redacted_connection_string(&self) -> String {
        let mut redacted = self.clone();
        if redacted.uses_sql_auth() {
            redacted.password = "***".to_string();
        }
        redacted.connection_string()
    }
}

/// Escape a value placed inside `{...}` in an ODBC connection string.
fn escape_braced(value: &str) -> String {
    value.replace('}', "}}")
}
