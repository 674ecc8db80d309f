//! SQL statement synthesis for generated tables.
//!
//! Builds the `CREATE TABLE` and `INSERT` text for a [`TableSchema`] and its rows.
//! Every generated column identifier is the source column name with [`COLUMN_PREFIX`]
//! in front, so names like `order` or `key` never collide with reserved words.
//!
//! Values are inlined as literals. The only escaping applied to text is
//! [`escape_literal`]; callers that need injection safety should execute with
//! parameters instead of using [`build_insert`].

pub mod quote;

use crate::core::{Column, TableSchema, Value};
use crate::error::{ImportError, Result};
use crate::typemap::sql_type;

pub use quote::{quote_ident, validate_identifier};

/// Prefix added to every generated column identifier.
pub const COLUMN_PREFIX: &str = "col_";

/// Generated identifier for a source column name.
pub fn column_identifier(name: &str) -> String {
    format!("{}{}", COLUMN_PREFIX, name)
}

/// Build the `CREATE TABLE` statement for a schema.
///
/// Output shape:
///
/// ```text
/// CREATE TABLE Users (
///     col_id INT,
///     col_name VARCHAR(MAX)
/// );
/// ```
///
/// # Errors
///
/// Returns [`ImportError::UnsupportedType`] for the first column whose type has no
/// SQL mapping.
pub fn build_create_table(schema: &TableSchema) -> Result<String> {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);

    for column in &schema.columns {
        let sql_type = sql_type(column.value_type)?;
        sql.push_str(&format!(
            "    {} {},\n",
            column_identifier(&column.name),
            sql_type
        ));
    }

    let mut sql = sql.trim_end_matches([',', '\n']).to_string();
    sql.push_str("\n);");
    Ok(sql)
}

/// Build the `INSERT` statement for one row.
///
/// Output shape: `INSERT INTO Users (col_id, col_name) VALUES (1, 'A');`
///
/// # Errors
///
/// Returns [`ImportError::RowShape`] when the row and column counts differ.
pub fn build_insert(table_name: &str, columns: &[Column], row: &[Value]) -> Result<String> {
    if columns.len() != row.len() {
        return Err(ImportError::RowShape {
            table: table_name.to_string(),
            expected: columns.len(),
            actual: row.len(),
        });
    }

    let column_list = columns
        .iter()
        .map(|c| column_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let value_list = row.iter().map(render_value).collect::<Vec<_>>().join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table_name, column_list, value_list
    ))
}

/// Quote a string as a SQL literal, doubling embedded single quotes.
///
/// No other character is escaped.
pub fn escape_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a value as an inline SQL literal.
///
/// Floating point and decimal values use `.` as the decimal point and no digit
/// grouping, independent of any host locale. Non-finite floats have no SQL literal
/// and render as `NULL`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(s) => escape_literal(s),
        Value::F32(v) if v.is_finite() => v.to_string(),
        Value::F64(v) if v.is_finite() => v.to_string(),
        Value::F32(_) | Value::F64(_) => "NULL".to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::DateTime(dt) => escape_literal(&dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        Value::Bytes(b) => format!("0x{}", hex::encode_upper(b)),
        Value::I8(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemap::ValueType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn users() -> TableSchema {
        TableSchema::new("Users")
            .column("id", ValueType::I32)
            .column("name", ValueType::Text)
    }

    #[test]
    fn test_create_table_shape() {
        assert_eq!(
            build_create_table(&users()).unwrap(),
            "CREATE TABLE Users (\n    col_id INT,\n    col_name VARCHAR(MAX)\n);"
        );
    }

    #[test]
    fn test_create_table_is_deterministic() {
        let schema = users();
        assert_eq!(
            build_create_table(&schema).unwrap(),
            build_create_table(&schema).unwrap()
        );
    }

    #[test]
    fn test_create_table_every_mapped_type() {
        let schema = TableSchema::new("Item")
            .column("a", ValueType::I8)
            .column("b", ValueType::U8)
            .column("c", ValueType::I16)
            .column("d", ValueType::U32)
            .column("e", ValueType::F32)
            .column("f", ValueType::F64);
        assert_eq!(
            build_create_table(&schema).unwrap(),
            "CREATE TABLE Item (\n    col_a SMALLINT,\n    col_b SMALLINT,\n    col_c SMALLINT,\n    \
             col_d INT,\n    col_e REAL,\n    col_f FLOAT\n);"
        );
    }

    #[test]
    fn test_create_table_keeps_duplicate_columns() {
        let schema = TableSchema::new("Dup")
            .column("x", ValueType::I32)
            .column("x", ValueType::I32);
        assert_eq!(
            build_create_table(&schema).unwrap(),
            "CREATE TABLE Dup (\n    col_x INT,\n    col_x INT\n);"
        );
    }

    #[test]
    fn test_create_table_without_columns() {
        assert_eq!(
            build_create_table(&TableSchema::new("Nothing")).unwrap(),
            "CREATE TABLE Nothing (\n);"
        );
    }

    #[test]
    fn test_create_table_unsupported_type() {
        let schema = TableSchema::new("Flags")
            .column("id", ValueType::I32)
            .column("enabled", ValueType::Bool);
        let err = build_create_table(&schema).unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnsupportedType { ref type_name } if type_name == "bool"
        ));
    }

    #[test]
    fn test_insert_shape() {
        let schema = users();
        let sql = build_insert("Users", &schema.columns, &[Value::I32(1), "A".into()]).unwrap();
        assert_eq!(sql, "INSERT INTO Users (col_id, col_name) VALUES (1, 'A');");
    }

    #[test]
    fn test_insert_escapes_single_quotes() {
        let schema = users();
        let sql =
            build_insert("Users", &schema.columns, &[Value::I32(7), "O'Brien".into()]).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO Users (col_id, col_name) VALUES (7, 'O''Brien');"
        );
    }

    #[test]
    fn test_insert_rejects_misaligned_row() {
        let schema = users();
        let err = build_insert("Users", &schema.columns, &[Value::I32(1)]).unwrap_err();
        assert!(matches!(
            err,
            ImportError::RowShape {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_escape_literal_only_doubles_quotes() {
        assert_eq!(escape_literal("it's"), "'it''s'");
        assert_eq!(escape_literal("''"), "''''''");
        assert_eq!(escape_literal("a\\b;--"), "'a\\b;--'");
    }

    #[test]
    fn test_render_floats_invariant() {
        assert_eq!(render_value(&Value::F64(3.14)), "3.14");
        assert_eq!(render_value(&Value::F32(0.5)), "0.5");
        assert_eq!(render_value(&Value::F64(1234567.25)), "1234567.25");
        assert_eq!(render_value(&Value::F64(-2.0)), "-2");
        assert_eq!(render_value(&Value::F64(f64::NAN)), "NULL");
    }

    #[test]
    fn test_render_decimal_invariant() {
        let d = Decimal::from_str("1234.500").unwrap();
        assert_eq!(render_value(&Value::Decimal(d)), "1234.500");
    }

    #[test]
    fn test_render_other_values() {
        assert_eq!(render_value(&Value::Null), "NULL");
        assert_eq!(render_value(&Value::U8(255)), "255");
        assert_eq!(render_value(&Value::I16(-12)), "-12");
        assert_eq!(render_value(&Value::Bool(true)), "1");
        assert_eq!(render_value(&Value::Bytes(vec![0xde, 0xad])), "0xDEAD");

        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(
            render_value(&Value::DateTime(dt)),
            "'2024-03-09T14:05:00.000'"
        );
    }

    #[test]
    fn test_column_identifier() {
        assert_eq!(column_identifier("order"), "col_order");
    }
}
