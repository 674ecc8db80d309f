//! JSON dataset files.
//!
//! A dataset file lists tables with typed columns and positional rows:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "Users",
//!       "columns": [{ "name": "id", "type": "i32" }, { "name": "name", "type": "text" }],
//!       "rows": [[1, "A"], [2, null]]
//!     }
//!   ]
//! }
//! ```
//!
//! Column types use the [`ValueType`] names. `decimal` cells may be numbers or
//! strings, `datetime` cells are ISO-8601 strings and `bytes` cells are hex strings.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::core::{Column, Dataset, Row, SourceTable, TableSchema, Value};
use crate::error::{ImportError, Result};
use crate::typemap::ValueType;

#[derive(Debug, Deserialize)]
struct RawDataset {
    tables: Vec<RawTable>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    name: String,
    columns: Vec<RawColumn>,
    #[serde(default)]
    rows: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

/// Load a dataset from a JSON file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let dataset = from_json(&content)?;
    debug!(
        "Loaded {} tables ({} rows) from {:?}",
        dataset.tables.len(),
        dataset.row_count(),
        path.as_ref()
    );
    Ok(dataset)
}

/// Parse a dataset from JSON text.
pub fn from_json(json: &str) -> Result<Dataset> {
    let raw: RawDataset = serde_json::from_str(json)?;
    let tables = raw
        .tables
        .into_iter()
        .map(convert_table)
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::new(tables))
}

fn convert_table(raw: RawTable) -> Result<SourceTable> {
    let mut schema = TableSchema::new(raw.name);
    for column in raw.columns {
        let value_type = ValueType::parse(&column.type_name).ok_or_else(|| {
            ImportError::Dataset(format!(
                "table {}: column {} has unknown type '{}'",
                schema.name, column.name, column.type_name
            ))
        })?;
        schema.columns.push(Column::new(column.name, value_type));
    }

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (row_idx, cells) in raw.rows.into_iter().enumerate() {
        if cells.len() != schema.columns.len() {
            return Err(ImportError::Dataset(format!(
                "table {}: row {} has {} values, expected {}",
                schema.name,
                row_idx + 1,
                cells.len(),
                schema.columns.len()
            )));
        }

        let row = cells
            .into_iter()
            .zip(&schema.columns)
            .map(|(cell, column)| {
                convert_cell(&cell, column.value_type).map_err(|msg| {
                    ImportError::Dataset(format!(
                        "table {}: row {}, column {}: {}",
                        schema.name,
                        row_idx + 1,
                        column.name,
                        msg
                    ))
                })
            })
            .collect::<Result<Row>>()?;
        rows.push(row);
    }

    Ok(SourceTable::new(schema, rows))
}

fn convert_cell(cell: &JsonValue, ty: ValueType) -> std::result::Result<Value, String> {
    if cell.is_null() {
        return Ok(Value::Null);
    }

    let value = match ty {
        ValueType::I8 => Value::I8(int_cell(cell)?),
        ValueType::U8 => Value::U8(uint_cell(cell)?),
        ValueType::I16 => Value::I16(int_cell(cell)?),
        ValueType::U16 => Value::U16(uint_cell(cell)?),
        ValueType::I32 => Value::I32(int_cell(cell)?),
        ValueType::U32 => Value::U32(uint_cell(cell)?),
        ValueType::I64 => Value::I64(int_cell(cell)?),
        ValueType::U64 => Value::U64(uint_cell(cell)?),
        ValueType::F32 => {
            let v = float_cell(cell)?;
            let narrowed = v as f32;
            if !narrowed.is_finite() {
                return Err(format!("{} is out of range", v));
            }
            Value::F32(narrowed)
        }
        ValueType::F64 => Value::F64(float_cell(cell)?),
        ValueType::Decimal => {
            let text = match cell {
                JsonValue::Number(n) => n.to_string(),
                JsonValue::String(s) => s.clone(),
                other => return Err(format!("expected decimal, got {}", other)),
            };
            Value::Decimal(Decimal::from_str(&text).map_err(|e| e.to_string())?)
        }
        ValueType::Bool => Value::Bool(
            cell.as_bool()
                .ok_or_else(|| format!("expected bool, got {}", cell))?,
        ),
        ValueType::Text => Value::Text(str_cell(cell)?.to_string()),
        ValueType::DateTime => {
            let text = str_cell(cell)?;
            let parsed = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .ok_or_else(|| format!("invalid datetime '{}'", text))?;
            Value::DateTime(parsed)
        }
        ValueType::Bytes => {
            let text = str_cell(cell)?;
            let hex_text = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text);
            Value::Bytes(hex::decode(hex_text).map_err(|e| e.to_string())?)
        }
    };
    Ok(value)
}

fn int_cell<T: TryFrom<i64>>(cell: &JsonValue) -> std::result::Result<T, String> {
    let v = cell
        .as_i64()
        .ok_or_else(|| format!("expected integer, got {}", cell))?;
    T::try_from(v).map_err(|_| format!("{} is out of range", v))
}

fn uint_cell<T: TryFrom<u64>>(cell: &JsonValue) -> std::result::Result<T, String> {
    let v = cell
        .as_u64()
        .ok_or_else(|| format!("expected unsigned integer, got {}", cell))?;
    T::try_from(v).map_err(|_| format!("{} is out of range", v))
}

fn float_cell(cell: &JsonValue) -> std::result::Result<f64, String> {
    cell.as_f64()
        .ok_or_else(|| format!("expected number, got {}", cell))
}

fn str_cell(cell: &JsonValue) -> std::result::Result<&str, String> {
    cell.as_str()
        .ok_or_else(|| format!("expected string, got {}", cell))
}
