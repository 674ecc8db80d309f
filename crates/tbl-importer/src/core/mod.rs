//! Core data model shared by the statement builder, backends and importer.
//!
//! - [`schema`]: table schema descriptors, rows, datasets and query results
//! - [`value`]: runtime cell values

pub mod schema;
pub mod value;

pub use schema::{Column, Dataset, QueryResult, Row, SourceTable, TableSchema};
pub use value::Value;
