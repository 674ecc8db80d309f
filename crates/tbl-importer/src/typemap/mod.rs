//! Type mapping from runtime value types to SQL Server column types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// Runtime type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
    Bool,
    Text,
    DateTime,
    Bytes,
}

impl ValueType {
    /// Name used in dataset files and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::I8 => "i8",
            ValueType::U8 => "u8",
            ValueType::I16 => "i16",
            ValueType::U16 => "u16",
            ValueType::I32 => "i32",
            ValueType::U32 => "u32",
            ValueType::I64 => "i64",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Decimal => "decimal",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::DateTime => "datetime",
            ValueType::Bytes => "bytes",
        }
    }

    /// Parse a type name as written in dataset files.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.to_lowercase().as_str() {
            "i8" => ValueType::I8,
            "u8" => ValueType::U8,
            "i16" => ValueType::I16,
            "u16" => ValueType::U16,
            "i32" => ValueType::I32,
            "u32" => ValueType::U32,
            "i64" => ValueType::I64,
            "u64" => ValueType::U64,
            "f32" => ValueType::F32,
            "f64" => ValueType::F64,
            "decimal" => ValueType::Decimal,
            "bool" => ValueType::Bool,
            "text" => ValueType::Text,
            "datetime" => ValueType::DateTime,
            "bytes" => ValueType::Bytes,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a runtime value type to the SQL Server column type used for generated tables.
///
/// The table is fixed and matched exactly; there is no widening. Types outside the
/// table fail with [`ImportError::UnsupportedType`].
pub fn sql_type(value_type: ValueType) -> Result<&'static str> {
    match value_type {
        // Integer types
        ValueType::I32 | ValueType::U32 => Ok("INT"),
        ValueType::I8 | ValueType::U8 | ValueType::I16 => Ok("SMALLINT"),

        // Floating point
        ValueType::F64 => Ok("FLOAT"),
        ValueType::F32 => Ok("REAL"),

        // String types
        ValueType::Text => Ok("VARCHAR(MAX)"),

        other => Err(ImportError::unsupported_type(other.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types() {
        assert_eq!(sql_type(ValueType::I32).unwrap(), "INT");
        assert_eq!(sql_type(ValueType::U32).unwrap(), "INT");
        assert_eq!(sql_type(ValueType::I16).unwrap(), "SMALLINT");
        assert_eq!(sql_type(ValueType::I8).unwrap(), "SMALLINT");
        assert_eq!(sql_type(ValueType::U8).unwrap(), "SMALLINT");
    }

    #[test]
    fn test_float_types() {
        assert_eq!(sql_type(ValueType::F64).unwrap(), "FLOAT");
        assert_eq!(sql_type(ValueType::F32).unwrap(), "REAL");
    }

    #[test]
    fn test_string_types() {
        assert_eq!(sql_type(ValueType::Text).unwrap(), "VARCHAR(MAX)");
    }

    #[test]
    fn test_unsupported_types_name_the_type() {
        let unsupported = [
            ValueType::U16,
            ValueType::I64,
            ValueType::U64,
            ValueType::Decimal,
            ValueType::Bool,
            ValueType::DateTime,
            ValueType::Bytes,
        ];
        for ty in unsupported {
            match sql_type(ty) {
                Err(ImportError::UnsupportedType { type_name }) => {
                    assert_eq!(type_name, ty.name())
                }
                other => panic!("expected UnsupportedType for {}, got {:?}", ty, other),
            }
        }
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!(ValueType::parse("i32"), Some(ValueType::I32));
        assert_eq!(ValueType::parse("TEXT"), Some(ValueType::Text));
        assert_eq!(ValueType::parse("varchar"), None);
    }
}
