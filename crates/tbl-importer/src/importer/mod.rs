//! Import run coordinator.
//!
//! Sequence for one run:
//!
//! 1. connect (optionally creating the database first)
//! 2. optional cleanup of existing tables
//! 3. make sure `_VERSION` exists
//! 4. per table: `CREATE TABLE`, then one `INSERT` per row
//! 5. record the import version
//! 6. disconnect
//!
//! Connect, version-table creation and version recording are single-shot steps
//! whose failure aborts the run. Table creation and row inserts are batch steps:
//! a failure is recorded in the result and the run continues.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{self, open_backend, Backend};
use crate::cleanup::{self, CleanupReport};
use crate::config::{Config, ConnectionConfig, ImportConfig};
use crate::core::{Dataset, SourceTable};
use crate::error::Result;
use crate::progress::{ProgressEvent, ProgressReporter, TracingReporter};
use crate::sql::{build_create_table, build_insert};
use crate::version;

/// Database used to check for and create the target database.
const SERVER_DATABASE: &str = "master";

/// Behavior of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Version id recorded in `_VERSION`.
    pub version: i32,
    /// Drop every non-protected table first.
    pub drop_existing: bool,
    /// Create the target database when missing.
    pub create_database: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            version: config.version,
            drop_existing: config.drop_existing,
            create_database: config.create_database,
        }
    }
}

/// Outcome for one source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    pub created: bool,
    pub rows_inserted: usize,
    pub rows_failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    /// Version id recorded for this run.
    pub version: i32,

    /// "completed" or "completed_with_errors".
    pub status: String,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,

    pub tables_total: usize,
    pub tables_created: usize,
    pub tables_failed: usize,
    pub rows_inserted: usize,
    pub rows_failed: usize,
    pub failed_tables: Vec<String>,

    /// Whether this run created `_VERSION`.
    pub version_table_created: bool,

    /// Present when cleanup ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,

    /// Per-table outcomes in import order.
    pub tables: Vec<TableOutcome>,
}

impl ImportResult {
    /// Serialize the result as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether every table and row went in.
    pub fn is_clean(&self) -> bool {
        self.tables_failed == 0 && self.rows_failed == 0
    }
}

/// Result of a connectivity check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub backend: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs imports against one exclusively owned backend.
pub struct Importer {
    backend: Box<dyn Backend>,
    connection: ConnectionConfig,
    options: ImportOptions,
    reporter: Box<dyn ProgressReporter>,
}

impl Importer {
    /// Create an importer over an already constructed backend.
    pub fn new(backend: Box<dyn Backend>, connection: ConnectionConfig) -> Self {
        Self {
            backend,
            connection,
            options: ImportOptions::default(),
            reporter: Box::new(TracingReporter),
        }
    }

    /// Create an importer for the backend selected in the configuration.
    ///
    /// # Errors
    ///
    /// Fails with `NotImplemented` for backends without an implementation.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = open_backend(config.connection.backend)?;
        Ok(Self::new(backend, config.connection.clone())
            .with_options(ImportOptions::from(&config.import)))
    }

    #[must_use]
    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import every table of the dataset.
    pub fn run(&mut self, dataset: &Dataset) -> Result<ImportResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Starting import of {} tables ({} rows), version {}",
            dataset.tables.len(),
            dataset.row_count(),
            self.options.version
        );

        let outcome = self
            .prepare_database()
            .and_then(|()| self.connect())
            .and_then(|()| self.run_connected(dataset));
        self.close();
        let (version_table_created, cleanup, tables) = outcome?;

        let failed_tables: Vec<String> = tables
            .iter()
            .filter(|t| !t.created)
            .map(|t| t.table.clone())
            .collect();
        let rows_inserted: usize = tables.iter().map(|t| t.rows_inserted).sum();
        let rows_failed: usize = tables.iter().map(|t| t.rows_failed).sum();
        let tables_failed = failed_tables.len();

        let result = ImportResult {
            version: self.options.version,
            status: if tables_failed == 0 && rows_failed == 0 {
                "completed".to_string()
            } else {
                "completed_with_errors".to_string()
            },
            started_at,
            completed_at: Utc::now(),
            duration_seconds: start.elapsed().as_secs_f64(),
            tables_total: tables.len(),
            tables_created: tables.len() - tables_failed,
            tables_failed,
            rows_inserted,
            rows_failed,
            failed_tables,
            version_table_created,
            cleanup,
            tables,
        };

        info!(
            "Import finished: {}/{} tables, {} rows inserted, {} rows failed in {:.2}s",
            result.tables_created,
            result.tables_total,
            result.rows_inserted,
            result.rows_failed,
            result.duration_seconds
        );

        Ok(result)
    }

    /// Drop every non-protected table without importing anything.
    pub fn drop_all(&mut self) -> Result<CleanupReport> {
        self.connect()?;
        let report = cleanup::drop_all_tables(self.backend.as_mut(), self.reporter.as_ref());
        self.close();
        report
    }

    /// Read the `_VERSION` table.
    pub fn version_entries(&mut self) -> Result<Vec<version::VersionEntry>> {
        self.connect()?;
        let result = version::get_version_entry(self.backend.as_mut());
        self.close();
        version::VersionEntry::from_result(&result?)
    }

    /// Open and close a connection, timing the round trip.
    pub fn health_check(&mut self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .connect()
            .and_then(|()| self.backend.query_scalar("SELECT 1").map(|_| ()));
        let latency_ms = start.elapsed().as_millis() as u64;
        self.close();

        HealthCheckResult {
            backend: self.connection.backend.to_string(),
            connected: result.is_ok(),
            latency_ms,
            error: result.err().map(|e| e.to_string()),
        }
    }

    fn connect(&mut self) -> Result<()> {
        self.backend.connect(&self.connection)?;
        self.reporter.report(&ProgressEvent::Connected {
            backend: self.backend.backend_type().to_string(),
            database: self.connection.database_or_default().to_string(),
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.backend.state() == backend::ConnectionState::Connected {
            self.backend.disconnect();
            self.reporter.report(&ProgressEvent::Disconnected {
                backend: self.backend.backend_type().to_string(),
            });
        }
    }

    /// Database creation is part of an import only; other commands never create it.
    fn prepare_database(&mut self) -> Result<()> {
        if self.options.create_database {
            self.ensure_database()
        } else {
            Ok(())
        }
    }

    /// Create the target database through the server database when it is missing.
    fn ensure_database(&mut self) -> Result<()> {
        let database = self.connection.database_or_default().to_string();
        let server = ConnectionConfig {
            database: SERVER_DATABASE.to_string(),
            ..self.connection.clone()
        };

        self.backend.connect(&server)?;
        let result = backend::database_exists(self.backend.as_mut(), &database).and_then(|exists| {
            if exists {
                debug!("Database '{}' already exists", database);
                Ok(false)
            } else {
                backend::create_database(self.backend.as_mut(), &database).map(|()| true)
            }
        });
        self.backend.disconnect();

        if result? {
            self.reporter
                .report(&ProgressEvent::DatabaseCreated { database });
        }
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn run_connected(
        &mut self,
        dataset: &Dataset,
    ) -> Result<(bool, Option<CleanupReport>, Vec<TableOutcome>)> {
        let cleanup = if self.options.drop_existing {
            Some(cleanup::drop_all_tables(
                self.backend.as_mut(),
                self.reporter.as_ref(),
            )?)
        } else {
            None
        };

        let version_table_created = version::ensure_version_table(self.backend.as_mut())?;
        if version_table_created {
            self.reporter.report(&ProgressEvent::VersionTableCreated);
        }

        let tables: Vec<TableOutcome> = dataset
            .tables
            .iter()
            .map(|table| self.import_table(table))
            .collect();

        version::create_version_entry(self.backend.as_mut(), self.options.version)?;
        self.reporter.report(&ProgressEvent::VersionRecorded {
            version: self.options.version,
        });

        Ok((version_table_created, cleanup, tables))
    }

    fn import_table(&mut self, table: &SourceTable) -> TableOutcome {
        let name = table.name().to_string();

        let created = build_create_table(&table.schema)
            .and_then(|sql| self.backend.execute(&sql));
        if let Err(e) = created {
            self.reporter.report(&ProgressEvent::TableFailed {
                table: name.clone(),
                error: e.to_string(),
            });
            return TableOutcome {
                table: name,
                created: false,
                rows_inserted: 0,
                rows_failed: 0,
                error: Some(e.to_string()),
            };
        }
        self.reporter.report(&ProgressEvent::TableCreated {
            table: name.clone(),
            columns: table.schema.columns.len(),
        });

        let mut rows_inserted = 0;
        let mut rows_failed = 0;
        for (idx, row) in table.rows.iter().enumerate() {
            let inserted = build_insert(&name, &table.schema.columns, row)
                .and_then(|sql| self.backend.execute(&sql));
            match inserted {
                Ok(()) => rows_inserted += 1,
                Err(e) => {
                    rows_failed += 1;
                    self.reporter.report(&ProgressEvent::RowFailed {
                        table: name.clone(),
                        row: idx + 1,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.reporter.report(&ProgressEvent::TableImported {
            table: name.clone(),
            rows_inserted,
            rows_failed,
        });

        TableOutcome {
            table: name,
            created: true,
            rows_inserted,
            rows_failed,
            error: None,
        }
    }
}

/// Render every statement an import would execute for the dataset, without a backend.
///
/// # Errors
///
/// Fails on the first table with an unsupported column type or misaligned row.
pub fn render_statements(dataset: &Dataset) -> Result<Vec<String>> {
    let mut statements = Vec::with_capacity(dataset.tables.len() + dataset.row_count());
    for table in &dataset.tables {
        statements.push(build_create_table(&table.schema)?);
        for row in &table.rows {
            statements.push(build_insert(
                &table.schema.name,
                &table.schema.columns,
                row,
            )?);
        }
    }
    Ok(statements)
}
