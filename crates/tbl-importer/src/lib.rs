//! # tbl-importer
//!
//! Schema bootstrapper and tabular data importer for SQL Server.
//!
//! This library takes in-memory tables with typed columns and turns them into
//! database tables over a single ODBC connection:
//!
//! - **Type mapping** from column value types to SQL Server column types
//! - **Statement building** for `CREATE TABLE` and per-row `INSERT`
//! - **Version tracking** in a `_VERSION` table
//! - **Cleanup** of every user table before a fresh import
//! - **Lazy reconnect** when a statement finds the connection closed
//!
//! ## Example
//!
//! ```rust,no_run
//! use tbl_importer::{dataset, Config, Importer};
//!
//! fn main() -> tbl_importer::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let data = dataset::load("tables.json")?;
//!     let mut importer = Importer::from_config(&config)?;
//!     let result = importer.run(&data)?;
//!     println!("Inserted {} rows", result.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cleanup;
pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod importer;
pub mod progress;
pub mod sql;
pub mod typemap;
pub mod version;

// Re-exports for convenience
pub use backend::{open_backend, Backend, ConnectionState, OdbcBackend};
pub use cleanup::{drop_all_tables, CleanupReport};
pub use config::{BackendKind, Config, ConnectionConfig, ImportConfig};
pub use core::{Column, Dataset, QueryResult, Row, SourceTable, TableSchema, Value};
pub use error::{ImportError, Result};
pub use importer::{render_statements, HealthCheckResult, ImportOptions, ImportResult, Importer};
pub use progress::{JsonLinesReporter, ProgressEvent, ProgressReporter, TracingReporter};
pub use typemap::{sql_type, ValueType};
pub use version::VersionEntry;
