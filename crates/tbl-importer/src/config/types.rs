//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default ODBC driver name.
pub const DEFAULT_DRIVER: &str = "SQL Server";
/// Default server (local SQL Server Express instance).
pub const DEFAULT_HOST: &str = r"localhost\sqlexpress";
/// Default database name.
pub const DEFAULT_DATABASE: &str = "kodb_tbl";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Import behavior.
    #[serde(default)]
    pub import: ImportConfig,
}

/// Database backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Microsoft SQL Server over ODBC.
    #[default]
    SqlServer,

    /// MySQL. Named but not implemented.
    MySql,
}

impl BackendKind {
    /// Display name for logs and errors.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::SqlServer => "SqlServer",
            BackendKind::MySql => "MySQL",
        }
    }

    /// Parse a backend name as given on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sqlserver" | "mssql" => Some(BackendKind::SqlServer),
            "mysql" => Some(BackendKind::MySql),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Connection descriptor.
///
/// Blank `driver`, `host` and `database` fall back to built-in defaults. Without a
/// `user` the connection uses integrated authentication.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend variant (default: sqlserver).
    #[serde(default)]
    pub backend: BackendKind,

    /// ODBC driver name (default: "SQL Server").
    #[serde(default)]
    pub driver: String,

    /// Server host, optionally with instance (default: localhost\sqlexpress).
    #[serde(default)]
    pub host: String,

    /// Database name (default: kodb_tbl).
    #[serde(default)]
    pub database: String,

    /// Username. Empty means integrated authentication.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("backend", &self.backend)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ConnectionConfig {
    /// Effective ODBC driver name.
    pub fn driver_or_default(&self) -> &str {
        or_default(&self.driver, DEFAULT_DRIVER)
    }

    /// Effective server host.
    pub fn host_or_default(&self) -> &str {
        or_default(&self.host, DEFAULT_HOST)
    }

    /// Effective database name.
    pub fn database_or_default(&self) -> &str {
        or_default(&self.database, DEFAULT_DATABASE)
    }

    /// Whether SQL Server authentication (UID/PWD) is used.
    pub fn uses_sql_auth(&self) -> bool {
        !self.user.trim().is_empty()
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Import behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Version id recorded in `_VERSION` after the import (default: 1).
    #[serde(default = "default_version")]
    pub version: i32,

    /// Drop every non-system table before importing (default: false).
    #[serde(default)]
    pub drop_existing: bool,

    /// Create the database when it does not exist (default: false).
    #[serde(default)]
    pub create_database: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            drop_existing: false,
            create_database: false,
        }
    }
}

fn default_version() -> i32 {
    1
}
