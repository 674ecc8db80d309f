//! Progress events emitted by cleanup and import runs.
//!
//! The library never prints. Components report [`ProgressEvent`]s to a
//! [`ProgressReporter`]; the default [`TracingReporter`] turns them into log lines and
//! [`JsonLinesReporter`] writes one JSON object per event for machine consumers.

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

/// A discrete progress or result event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Connected {
        backend: String,
        database: String,
    },
    Disconnected {
        backend: String,
    },
    /// A table was dropped; `index` is 1-based.
    TableDropped {
        index: usize,
        total: usize,
        table: String,
    },
    DropFailed {
        index: usize,
        total: usize,
        table: String,
        error: String,
    },
    DatabaseCreated {
        database: String,
    },
    VersionTableCreated,
    TableCreated {
        table: String,
        columns: usize,
    },
    TableFailed {
        table: String,
        error: String,
    },
    RowFailed {
        table: String,
        row: usize,
        error: String,
    },
    TableImported {
        table: String,
        rows_inserted: usize,
        rows_failed: usize,
    },
    VersionRecorded {
        version: i32,
    },
}

/// Receiver for progress events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Connected { backend, database } => {
                info!("Connected to the database {} using {}", database, backend)
            }
            ProgressEvent::Disconnected { backend } => {
                info!("Disconnected from the database using {}", backend)
            }
            ProgressEvent::TableDropped {
                index,
                total,
                table,
            } => info!("Table '{}' {} of {} was dropped", table, index, total),
            ProgressEvent::DropFailed {
                index,
                total,
                table,
                error,
            } => warn!("Table '{}' {} of {} could not be dropped: {}", table, index, total, error),
            ProgressEvent::DatabaseCreated { database } => {
                info!("Created database '{}'", database)
            }
            ProgressEvent::VersionTableCreated => info!("Created _VERSION table"),
            ProgressEvent::TableCreated { table, columns } => {
                info!("Created table {} ({} columns)", table, columns)
            }
            ProgressEvent::TableFailed { table, error } => {
                warn!("Table {} skipped: {}", table, error)
            }
            ProgressEvent::RowFailed { table, row, error } => {
                warn!("Row {} of {} failed: {}", row, table, error)
            }
            ProgressEvent::TableImported {
                table,
                rows_inserted,
                rows_failed,
            } => info!(
                "Imported {}: {} rows inserted, {} failed",
                table, rows_inserted, rows_failed
            ),
            ProgressEvent::VersionRecorded { version } => {
                info!("Recorded version {} in _VERSION", version)
            }
        }
    }
}

/// Writes each event as a JSON line.
pub struct JsonLinesReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the reporter and return the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressReporter for JsonLinesReporter<W> {
    fn report(&self, event: &ProgressEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize progress event: {}", e);
                return;
            }
        };
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Progress output is best effort
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Collects events for assertions.
    #[derive(Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
