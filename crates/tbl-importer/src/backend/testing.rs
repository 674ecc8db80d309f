//! In-memory backend double for unit tests.
//!
//! Understands just enough SQL to stand in for a server during version, cleanup
//! and import tests: it tracks tables, databases and `_VERSION` rows, records every
//! statement, and can be told to fail statements containing a given fragment.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Backend, ConnectionState};
use crate::config::ConnectionConfig;
use crate::core::QueryResult;
use crate::error::{ImportError, Result};

/// Shared view of what a [`FakeBackend`] saw, still readable after the backend
/// has been moved into an importer.
#[derive(Clone, Default)]
pub struct Journal {
    statements: Rc<RefCell<Vec<String>>>,
    connects: Rc<Cell<usize>>,
}

impl Journal {
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// Explicit `connect` calls.
    pub fn connects(&self) -> usize {
        self.connects.get()
    }
}

#[derive(Default)]
pub struct FakeBackend {
    state: ConnectionState,
    config: Option<ConnectionConfig>,
    tables: Vec<String>,
    databases: Vec<String>,
    version_rows: Vec<i64>,
    executed: Vec<String>,
    fail_on: Vec<String>,
    fail_list_tables: bool,
    journal: Journal,
    pub reconnects: usize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that has already been connected with a default descriptor.
    pub fn connected() -> Self {
        let mut backend = Self::new();
        backend
            .connect(&ConnectionConfig::default())
            .expect("fake connect");
        backend.journal.connects.set(0);
        backend
    }

    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Fail any statement containing `fragment`.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn fail_list_tables(mut self) -> Self {
        self.fail_list_tables = true;
        self
    }

    pub fn create_table(&mut self, name: &str) {
        self.tables.push(name.to_string());
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn version_rows(&self) -> &[i64] {
        &self.version_rows
    }

    /// Simulate the server closing the connection.
    pub fn drop_connection(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.state == ConnectionState::Disconnected {
            if self.config.is_none() {
                return Err(ImportError::NotConnected);
            }
            self.state = ConnectionState::Connected;
            self.reconnects += 1;
        }
        Ok(())
    }

    fn run(&mut self, sql: &str) -> Result<QueryResult> {
        self.ensure_connected()?;
        self.executed.push(sql.to_string());
        self.journal.statements.borrow_mut().push(sql.to_string());

        if self.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(ImportError::Backend {
                message: format!("statement rejected: {}", sql),
                sql_state: Some("42000".to_string()),
            });
        }

        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let name = rest
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default()
                .to_string();
            if self.tables.contains(&name) {
                return Err(ImportError::Backend {
                    message: format!("There is already an object named '{}' in the database.", name),
                    sql_state: Some("42S01".to_string()),
                });
            }
            self.tables.push(name);
        } else if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
            let name = unbracket(rest);
            let before = self.tables.len();
            self.tables.retain(|t| *t != name);
            if self.tables.len() == before {
                return Err(ImportError::Backend {
                    message: format!("Cannot drop the table '{}'", name),
                    sql_state: Some("42S02".to_string()),
                });
            }
        } else if let Some(rest) = sql.strip_prefix("CREATE DATABASE ") {
            let name = unbracket(rest);
            if self.databases.contains(&name) {
                return Err(ImportError::Backend {
                    message: format!("Database '{}' already exists.", name),
                    sql_state: Some("42000".to_string()),
                });
            }
            self.databases.push(name);
        } else if let Some(rest) = sql.strip_prefix("INSERT INTO _VERSION (VersionID) VALUES (") {
            if !self.tables.iter().any(|t| t == "_VERSION") {
                return Err(ImportError::Backend {
                    message: "Invalid object name '_VERSION'.".to_string(),
                    sql_state: Some("42S02".to_string()),
                });
            }
            let version = rest
                .trim_end_matches(';')
                .trim_end_matches(')')
                .parse::<i64>()
                .map_err(|e| ImportError::Unexpected(e.to_string()))?;
            self.version_rows.push(version);
        } else if sql.starts_with("SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES") {
            let name = quoted_literal(sql);
            let count = self.tables.iter().filter(|t| **t == name).count();
            return Ok(scalar(count));
        } else if sql.starts_with("SELECT COUNT(*) FROM sys.databases") {
            let name = quoted_literal(sql);
            let count = self.databases.iter().filter(|d| **d == name).count();
            return Ok(scalar(count));
        } else if sql == "SELECT * FROM _VERSION" {
            if !self.tables.iter().any(|t| t == "_VERSION") {
                return Err(ImportError::Backend {
                    message: "Invalid object name '_VERSION'.".to_string(),
                    sql_state: Some("42S02".to_string()),
                });
            }
            return Ok(QueryResult {
                columns: vec!["VersionID".to_string(), "CreatedAt".to_string()],
                rows: self
                    .version_rows
                    .iter()
                    .map(|v| {
                        vec![
                            Some(v.to_string()),
                            Some("2024-05-01 10:00:00.000".to_string()),
                        ]
                    })
                    .collect(),
            });
        }

        Ok(QueryResult::default())
    }
}

fn scalar(value: usize) -> QueryResult {
    QueryResult {
        columns: vec![String::new()],
        rows: vec![vec![Some(value.to_string())]],
    }
}

fn unbracket(name: &str) -> String {
    let name = name.trim();
    match name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        Some(inner) => inner.replace("]]", "]"),
        None => name.to_string(),
    }
}

/// Content of the last `'...'` literal, with doubled quotes collapsed.
fn quoted_literal(sql: &str) -> String {
    match (sql.find('\''), sql.rfind('\'')) {
        (Some(start), Some(end)) if end > start => sql[start + 1..end].replace("''", "'"),
        _ => String::new(),
    }
}

impl Backend for FakeBackend {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        self.config = Some(config.clone());
        self.state = ConnectionState::Connected;
        self.journal.connects.set(self.journal.connects.get() + 1);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.run(sql).map(|_| ())
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.run(sql)
    }

    fn list_tables(&mut self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        if self.fail_list_tables {
            return Err(ImportError::backend("catalog unavailable"));
        }
        Ok(self.tables.clone())
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnects_after_drop() {
        let mut backend = FakeBackend::connected();
        backend.drop_connection();
        assert_eq!(backend.state(), ConnectionState::Disconnected);

        backend.execute("SELECT 1").unwrap();
        assert_eq!(backend.state(), ConnectionState::Connected);
        assert_eq!(backend.reconnects, 1);
    }

    #[test]
    fn test_journal_survives_move() {
        let backend = FakeBackend::connected();
        let journal = backend.journal();
        let mut boxed: Box<dyn Backend> = Box::new(backend);

        boxed.connect(&ConnectionConfig::default()).unwrap();
        boxed.execute("SELECT 1").unwrap();

        assert_eq!(journal.connects(), 1);
        assert_eq!(journal.statements(), ["SELECT 1"]);
    }

    #[test]
    fn test_never_connected_fails() {
        let mut backend = FakeBackend::new();
        assert!(matches!(
            backend.execute("SELECT 1"),
            Err(ImportError::NotConnected)
        ));
    }

    #[test]
    fn test_unbracket() {
        assert_eq!(unbracket("[a]]b]"), "a]b");
        assert_eq!(unbracket("plain"), "plain");
    }
}
