//! Table schema descriptors and result sets.

use serde::Serialize;

use super::value::Value;
use crate::typemap::ValueType;

/// A source column: its original name and runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Table name plus ordered columns.
///
/// Column order is kept as given and duplicate names are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column, builder style.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.columns.push(Column::new(name, value_type));
        self
    }
}

/// Values aligned positionally with a [`TableSchema`]'s columns.
pub type Row = Vec<Value>;

/// A table to import: its schema and its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
}

impl SourceTable {
    pub fn new(schema: TableSchema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

/// Every table of one import run, in import order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub tables: Vec<SourceTable>,
}

impl Dataset {
    pub fn new(tables: Vec<SourceTable>) -> Self {
        Self { tables }
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Tabular result returned by a backend query.
///
/// Cells are kept as driver text; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Index of a column by case-insensitive name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
