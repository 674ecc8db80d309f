//! Configuration validation.

use super::Config;
use crate::error::{ImportError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let conn = &config.connection;

    for (field, value) in [
        ("connection.driver", &conn.driver),
        ("connection.host", &conn.host),
        ("connection.database", &conn.database),
    ] {
        if value.contains(';') || value.contains('{') || value.contains('}') {
            return Err(ImportError::Config(format!(
                "{} must not contain ';', '{{' or '}}'",
                field
            )));
        }
    }

    if conn.uses_sql_auth() && conn.user.contains(';') {
        return Err(ImportError::Config(
            "connection.user must not contain ';'".into(),
        ));
    }

    if !conn.uses_sql_auth() && !conn.password.is_empty() {
        return Err(ImportError::Config(
            "connection.password is set but connection.user is empty".into(),
        ));
    }

    if config.import.version < 0 {
        return Err(ImportError::Config(format!(
            "import.version must not be negative, got {}",
            config.import.version
        )));
    }

    Ok(())
}
