//! Dropping every user table before a re-import.
//!
//! Tables are enumerated through the backend's catalog. Names starting with `sys`
//! and the two extended-events mapping tables are protected; everything else is
//! dropped one statement at a time, in enumeration order. A failed drop is
//! recorded and the loop moves on, so a partially cleaned schema is a valid end
//! state.

use serde::Serialize;
use tracing::info;

use crate::backend::Backend;
use crate::error::Result;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::sql::quote_ident;

/// Prefix of tables that are never dropped.
pub const PROTECTED_PREFIX: &str = "sys";

/// Utility tables that are never dropped.
pub const PROTECTED_TABLES: [&str; 2] = ["trace_xe_action_map", "trace_xe_event_map"];

/// Whether a table must survive cleanup.
pub fn is_protected_table(name: &str) -> bool {
    name.starts_with(PROTECTED_PREFIX) || PROTECTED_TABLES.contains(&name)
}

/// Outcome of one drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub table: String,
    /// Driver message when the drop failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of [`drop_all_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Number of droppable tables found.
    pub total: usize,
    /// Protected tables that were left alone.
    pub skipped: Vec<String>,
    /// One entry per droppable table, in drop order.
    pub outcomes: Vec<ItemOutcome>,
}

impl CleanupReport {
    /// Tables that were dropped.
    pub fn dropped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.table.as_str())
            .collect()
    }

    /// Tables whose drop failed.
    pub fn failed(&self) -> Vec<&ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }
}

/// Drop every non-protected table.
///
/// # Errors
///
/// Only a failure to enumerate tables is returned. Individual drop failures are
/// reported as [`ProgressEvent::DropFailed`] and recorded in the [`CleanupReport`].
pub fn drop_all_tables(
    backend: &mut dyn Backend,
    reporter: &dyn ProgressReporter,
) -> Result<CleanupReport> {
    let tables = backend.list_tables()?;

    let (skipped, droppable): (Vec<String>, Vec<String>) =
        tables.into_iter().partition(|t| is_protected_table(t));

    let total = droppable.len();
    info!(
        "Dropping {} tables ({} protected tables skipped)",
        total,
        skipped.len()
    );

    let mut outcomes = Vec::with_capacity(total);
    for (i, table) in droppable.into_iter().enumerate() {
        let index = i + 1;
        let result = quote_ident(&table)
            .and_then(|quoted| backend.execute(&format!("DROP TABLE {}", quoted)));

        match result {
            Ok(()) => {
                reporter.report(&ProgressEvent::TableDropped {
                    index,
                    total,
                    table: table.clone(),
                });
                outcomes.push(ItemOutcome { table, error: None });
            }
            Err(e) => {
                reporter.report(&ProgressEvent::DropFailed {
                    index,
                    total,
                    table: table.clone(),
                    error: e.to_string(),
                });
                outcomes.push(ItemOutcome {
                    table,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(CleanupReport {
        total,
        skipped,
        outcomes,
    })
}
