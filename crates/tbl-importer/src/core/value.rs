//! Runtime values carried by source rows.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::typemap::ValueType;

/// One cell of a source row.
///
/// Each variant corresponds to a [`ValueType`], except `Null`, which carries no type
/// and renders as SQL `NULL` regardless of the column it sits in.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,

    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),

    /// Single-precision float.
    F32(f32),

    /// Double-precision float.
    F64(f64),

    /// Exact decimal.
    Decimal(Decimal),

    Bool(bool),

    /// Text data.
    Text(String),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Runtime type of this value, or `None` for `Null`.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        let ty = match self {
            Value::Null => return None,
            Value::I8(_) => ValueType::I8,
            Value::U8(_) => ValueType::U8,
            Value::I16(_) => ValueType::I16,
            Value::U16(_) => ValueType::U16,
            Value::I32(_) => ValueType::I32,
            Value::U32(_) => ValueType::U32,
            Value::I64(_) => ValueType::I64,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Bytes(_) => ValueType::Bytes,
        };
        Some(ty)
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
