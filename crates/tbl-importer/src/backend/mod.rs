//! Database backends.
//!
//! A backend is the narrow capability set the rest of the crate needs from a
//! database driver: connect, disconnect, execute, query and table introspection.
//! [`open_backend`] resolves a [`BackendKind`] to a concrete implementation.
//!
//! # Connection lifecycle
//!
//! A backend starts [`ConnectionState::Disconnected`]. [`Backend::connect`] opens the
//! connection and remembers the descriptor; [`Backend::disconnect`] closes it and is a
//! no-op when already closed. Every execution entry point reopens the connection with
//! the remembered descriptor when it finds it closed. There is no retry or backoff.

mod odbc;

#[cfg(test)]
pub(crate) mod testing;

pub use odbc::OdbcBackend;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{BackendKind, ConnectionConfig};
use crate::core::QueryResult;
use crate::error::{ImportError, Result};
use crate::sql::{escape_literal, quote_ident};

/// Whether a backend currently holds an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Capability set of a database backend.
pub trait Backend {
    /// Open a connection using the given descriptor.
    ///
    /// The descriptor is kept for later transparent reconnects.
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()>;

    /// Close the connection. No-op when already disconnected.
    fn disconnect(&mut self);

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Execute a statement that returns no rows.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Execute a query and collect its full result set.
    fn query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Execute a query and return the first column of the first row as an integer.
    ///
    /// An empty result set yields 0.
    fn query_scalar(&mut self, sql: &str) -> Result<i64> {
        let result = self.query(sql)?;
        let cell = result
            .rows
            .first()
            .and_then(|row| row.first())
            .cloned()
            .flatten();

        match cell {
            Some(text) => text.trim().parse::<i64>().map_err(|e| {
                ImportError::Unexpected(format!(
                    "scalar result '{}' is not an integer: {} - SQL: {}",
                    text, e, sql
                ))
            }),
            None => Ok(0),
        }
    }

    /// Names of the tables visible in the current database, in enumeration order.
    fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

/// Resolve a backend variant to an implementation.
///
/// # Errors
///
/// Returns [`ImportError::NotImplemented`] for variants without an implementation.
pub fn open_backend(kind: BackendKind) -> Result<Box<dyn Backend>> {
    match kind {
        BackendKind::SqlServer => Ok(Box::new(OdbcBackend::new())),
        BackendKind::MySql => Err(ImportError::NotImplemented(
            kind.display_name().to_string(),
        )),
    }
}

/// Check whether a database with the given name exists on the server.
pub fn database_exists(backend: &mut dyn Backend, name: &str) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM sys.databases WHERE name = {}",
        escape_literal(name)
    );
    let count = backend.query_scalar(&sql)?;
    debug!("Database '{}' exists: {}", name, count > 0);
    Ok(count > 0)
}

/// Create a database. Fails when it already exists.
pub fn create_database(backend: &mut dyn Backend, name: &str) -> Result<()> {
    let sql = format!("CREATE DATABASE {}", quote_ident(name)?);
    backend.execute(&sql)?;
    info!("Created database '{}'", name);
    Ok(())
}
