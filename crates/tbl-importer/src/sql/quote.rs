//! Identifier validation and bracket quoting for SQL Server.
//!
//! Generated table and column names are inlined as written (the `col_` prefix is
//! the only transformation). Statements that name *existing* objects, such as
//! `DROP TABLE` over an enumerated inventory or `CREATE DATABASE`, bracket-quote
//! the name instead, since enumerated names can contain any character.

use crate::error::{ImportError, Result};

/// Maximum identifier length accepted by SQL Server (`sysname`).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before it is placed into SQL text.
///
/// Rejects empty identifiers, identifiers containing null bytes and identifiers
/// longer than SQL Server allows.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ImportError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(ImportError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ImportError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a SQL Server identifier using brackets, doubling any closing bracket.
///
/// ```
/// use tbl_importer::sql::quote_ident;
///
/// assert_eq!(quote_ident("Orders").unwrap(), "[Orders]");
/// assert_eq!(quote_ident("odd]name").unwrap(), "[odd]]name]");
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}
