//! Import version tracking in the `_VERSION` table.
//!
//! Each import appends one row holding the import's version id; the server fills
//! `CreatedAt`. Rows are never updated or deleted, so repeated imports accumulate.
//!
//! Bootstrap sequence: [`table_version_exists`] → [`create_version_table`] when
//! absent → [`create_version_entry`]. [`bootstrap`] runs all three.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::core::QueryResult;
use crate::error::{ImportError, Result};

/// Name of the version table.
pub const VERSION_TABLE: &str = "_VERSION";

/// One row of `_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub version_id: i32,
    pub created_at: Option<NaiveDateTime>,
}

impl VersionEntry {
    /// Parse the rows of a `SELECT * FROM _VERSION` result.
    pub fn from_result(result: &QueryResult) -> Result<Vec<Self>> {
        let id_idx = result.column_index("VersionID").ok_or_else(|| {
            ImportError::Unexpected("_VERSION result has no VersionID column".to_string())
        })?;
        let created_idx = result.column_index("CreatedAt");

        let mut entries = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            let version_id = match row.get(id_idx).cloned().flatten() {
                Some(text) => text.trim().parse::<i32>().map_err(|e| {
                    ImportError::Unexpected(format!("invalid VersionID '{}': {}", text, e))
                })?,
                None => continue,
            };
            let created_at = created_idx
                .and_then(|idx| row.get(idx).cloned().flatten())
                .and_then(|text| parse_timestamp(&text));
            entries.push(VersionEntry {
                version_id,
                created_at,
            });
        }
        Ok(entries)
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
}

/// Check whether `_VERSION` exists in the current database.
pub fn table_version_exists(backend: &mut dyn Backend) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = '{}'",
        VERSION_TABLE
    );
    let count = backend.query_scalar(&sql)?;
    Ok(count > 0)
}

/// Create `_VERSION`.
///
/// Fails when the table already exists; checking first is the caller's job.
pub fn create_version_table(backend: &mut dyn Backend) -> Result<()> {
    let sql = format!(
        "CREATE TABLE {} (VersionID INT, CreatedAt DATETIME DEFAULT CURRENT_TIMESTAMP)",
        VERSION_TABLE
    );
    backend.execute(&sql)?;
    info!("Successful creation of {} table", VERSION_TABLE);
    Ok(())
}

/// Append one version row.
pub fn create_version_entry(backend: &mut dyn Backend, version: i32) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (VersionID) VALUES ({});",
        VERSION_TABLE, version
    );
    backend.execute(&sql)?;
    info!("Recorded version {} in {}", version, VERSION_TABLE);
    Ok(())
}

/// Full contents of `_VERSION`.
pub fn get_version_entry(backend: &mut dyn Backend) -> Result<QueryResult> {
    backend.query(&format!("SELECT * FROM {}", VERSION_TABLE))
}

/// Create `_VERSION` if it does not exist. Returns whether it was created.
pub fn ensure_version_table(backend: &mut dyn Backend) -> Result<bool> {
    if table_version_exists(backend)? {
        debug!("{} table already exists", VERSION_TABLE);
        return Ok(false);
    }
    create_version_table(backend)?;
    Ok(true)
}

/// Full bootstrap: ensure `_VERSION` exists, then record `version`.
pub fn bootstrap(backend: &mut dyn Backend, version: i32) -> Result<()> {
    ensure_version_table(backend)?;
    create_version_entry(backend, version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;

    #[test]
    fn test_exists_false_on_empty_database() {
        let mut backend = FakeBackend::connected();
        assert!(!table_version_exists(&mut backend).unwrap());
        assert_eq!(
            backend.executed(),
            ["SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = '_VERSION'"]
        );
    }

    #[test]
    fn test_bootstrap_leaves_one_row() {
        let mut backend = FakeBackend::connected();
        bootstrap(&mut backend, 1298).unwrap();

        assert!(table_version_exists(&mut backend).unwrap());
        assert_eq!(backend.version_rows(), [1298]);
        assert!(backend.executed().contains(
            &"CREATE TABLE _VERSION (VersionID INT, CreatedAt DATETIME DEFAULT CURRENT_TIMESTAMP)"
                .to_string()
        ));
        assert!(backend
            .executed()
            .contains(&"INSERT INTO _VERSION (VersionID) VALUES (1298);".to_string()));
    }

    #[test]
    fn test_second_create_fails() {
        let mut backend = FakeBackend::connected();
        create_version_table(&mut backend).unwrap();
        let err = create_version_table(&mut backend).unwrap_err();
        assert_eq!(err.sql_state(), Some("42S01"));
        assert_eq!(
            backend.tables().iter().filter(|t| *t == VERSION_TABLE).count(),
            1
        );
    }

    #[test]
    fn test_repeated_bootstrap_accumulates_rows() {
        let mut backend = FakeBackend::connected();
        bootstrap(&mut backend, 1).unwrap();
        bootstrap(&mut backend, 2).unwrap();
        assert_eq!(backend.version_rows(), [1, 2]);

        let creates = backend
            .executed()
            .iter()
            .filter(|s| s.starts_with("CREATE TABLE _VERSION"))
            .count();
        assert_eq!(creates, 1);
    }

    #[test]
    fn test_ensure_reports_creation() {
        let mut backend = FakeBackend::connected();
        assert!(ensure_version_table(&mut backend).unwrap());
        assert!(!ensure_version_table(&mut backend).unwrap());
    }

    #[test]
    fn test_get_version_entry_parses() {
        let mut backend = FakeBackend::connected();
        bootstrap(&mut backend, 7).unwrap();

        let result = get_version_entry(&mut backend).unwrap();
        let entries = VersionEntry::from_result(&result).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version_id, 7);
        assert_eq!(
            entries[0].created_at.unwrap().to_string(),
            "2024-05-01 10:00:00"
        );
    }

    #[test]
    fn test_get_version_entry_without_table_fails() {
        let mut backend = FakeBackend::connected();
        assert!(get_version_entry(&mut backend).is_err());
    }

    #[test]
    fn test_from_result_requires_version_column() {
        let result = QueryResult {
            columns: vec!["Other".into()],
            rows: vec![],
        };
        assert!(VersionEntry::from_result(&result).is_err());
    }
}
