//! SQL Server backend over ODBC.
//!
//! **Requirements:** an ODBC driver for SQL Server must be installed. The classic
//! `SQL Server` driver ships with Windows; on Linux/macOS install `msodbcsql18` and
//! set `connection.driver: "ODBC Driver 18 for SQL Server"`.
//!
//! Statements run one at a time on a single connection. There is no pooling and no
//! transaction wrapping: every statement commits on its own.

use std::sync::OnceLock;

use odbc_api::buffers::TextRowSet;
use odbc_api::{Connection, ConnectionOptions, Cursor, Environment};
use tracing::{debug, info};

use super::{Backend, ConnectionState};
use crate::config::ConnectionConfig;
use crate::core::QueryResult;
use crate::error::{ImportError, Result};

/// Rows fetched per round trip when reading result sets.
const FETCH_BATCH_SIZE: usize = 256;

/// Upper bound for text cells whose declared size is unbounded (e.g. `VARCHAR(MAX)`).
const MAX_TEXT_CELL_BYTES: usize = 8192;

/// Process-wide ODBC environment. Connections borrow from it, so it lives for the
/// rest of the process once created.
static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

fn odbc_environment() -> Result<&'static Environment> {
    if let Some(env) = ODBC_ENV.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        ImportError::backend(format!(
            "Failed to create ODBC environment: {}. \
             Is an ODBC driver manager installed?",
            e
        ))
    })?;
    Ok(ODBC_ENV.get_or_init(|| env))
}

/// Convert a driver error, keeping the SQLSTATE when the driver reported one.
fn odbc_error(e: odbc_api::Error) -> ImportError {
    let sql_state = match &e {
        odbc_api::Error::Diagnostics { record, .. } => Some(record.state.as_str().to_string()),
        _ => None,
    };
    ImportError::Backend {
        message: e.to_string(),
        sql_state,
    }
}

/// Whether a held connection can be reused, given the driver's liveness answer.
///
/// A failed liveness check counts as dead.
fn still_alive(is_dead: std::result::Result<bool, odbc_api::Error>) -> bool {
    matches!(is_dead, Ok(false))
}

/// SQL Server backend using an ODBC driver.
pub struct OdbcBackend {
    conn: Option<Connection<'static>>,
    /// Descriptor from the last `connect`, reused for transparent reconnects.
    config: Option<ConnectionConfig>,
}

impl OdbcBackend {
    /// Create a disconnected backend.
    pub fn new() -> Self {
        Self {
            conn: None,
            config: None,
        }
    }

    fn open(&mut self, config: &ConnectionConfig) -> Result<()> {
        let env = odbc_environment()?;
        debug!(
            "ODBC connection string (credentials hidden): {}",
            config.redacted_connection_string()
        );

        let conn = env
            .connect_with_connection_string(
                &config.connection_string(),
                ConnectionOptions::default(),
            )
            .map_err(odbc_error)?;

        self.conn = Some(conn);
        Ok(())
    }

    /// The open connection, reopening it first when it was closed or the driver
    /// reports it dead.
    fn connection(&mut self) -> Result<&Connection<'static>> {
        if let Some(conn) = &self.conn {
            if !still_alive(conn.is_dead()) {
                debug!("Connection reported dead by the driver, dropping it");
                self.conn = None;
            }
        }

        if self.conn.is_none() {
            let config = self.config.clone().ok_or(ImportError::NotConnected)?;
            debug!("Connection is closed, reopening");
            self.open(&config)?;
        }
        self.conn.as_ref().ok_or(ImportError::NotConnected)
    }

    fn catalog(&self) -> String {
        self.config
            .as_ref()
            .map(|c| c.database_or_default().to_string())
            .unwrap_or_default()
    }
}

impl Default for OdbcBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for OdbcBackend {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        self.config = Some(config.clone());
        self.conn = None;
        self.open(config)?;
        info!(
            "Connected to {} / {} using {}",
            config.host_or_default(),
            config.database_or_default(),
            config.backend
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            info!("Disconnected from the database using ODBC");
        }
    }

    fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(sql, ()).map_err(odbc_error)?;
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self.connection()?;
        match conn.execute(sql, ()).map_err(odbc_error)? {
            Some(cursor) => read_result_set(cursor),
            None => Ok(QueryResult::default()),
        }
    }

    fn list_tables(&mut self) -> Result<Vec<String>> {
        let catalog = self.catalog();
        let conn = self.connection()?;
        let cursor = conn
            .tables(&catalog, "%", "%", "TABLE")
            .map_err(odbc_error)?;
        let result = read_result_set(cursor)?;

        // SQLTables result sets put TABLE_NAME third.
        let name_idx = result.column_index("TABLE_NAME").unwrap_or(2);
        Ok(result
            .rows
            .into_iter()
            .filter_map(|mut row| {
                if name_idx < row.len() {
                    row.swap_remove(name_idx)
                } else {
                    None
                }
            })
            .collect())
    }

    fn backend_type(&self) -> &'static str {
        "odbc"
    }
}

/// Drain a cursor into a [`QueryResult`], reading every cell as text.
fn read_result_set<C: Cursor>(mut cursor: C) -> Result<QueryResult> {
    let num_cols = cursor.num_result_cols().map_err(odbc_error)?;
    if num_cols <= 0 {
        return Ok(QueryResult::default());
    }

    let mut columns = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols as u16 {
        columns.push(cursor.col_name(col).map_err(odbc_error)?);
    }

    let mut buffers =
        TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_CELL_BYTES))
            .map_err(odbc_error)?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers).map_err(odbc_error)?;

    let mut rows = Vec::new();
    while let Some(batch) = row_cursor.fetch().map_err(odbc_error)? {
        for row_idx in 0..batch.num_rows() {
            let row = (0..batch.num_cols())
                .map(|col_idx| {
                    batch
                        .at(col_idx, row_idx)
                        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                })
                .collect();
            rows.push(row);
        }
    }

    Ok(QueryResult { columns, rows })
}
