//! Error types for the importer library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for statements rejected by the database.
pub const EXIT_BACKEND_ERROR: u8 = 2;
/// Exit code for source data that cannot be mapped to SQL.
pub const EXIT_DATA_ERROR: u8 = 3;
/// Exit code for backends that are named but not implemented.
pub const EXIT_NOT_IMPLEMENTED: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for anything else.
pub const EXIT_UNEXPECTED: u8 = 10;

/// Main error type for import operations.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Configuration error (invalid YAML, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A column or value type has no SQL mapping.
    #[error("Data type {type_name} not supported")]
    UnsupportedType { type_name: String },

    /// A row does not line up with its table schema.
    #[error("Row for table {table} has {actual} values, expected {expected}")]
    RowShape {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// The database rejected a statement or the connection failed.
    #[error("{}", format_backend(.message, .sql_state))]
    Backend {
        message: String,
        sql_state: Option<String>,
    },

    /// A statement was issued before any connection descriptor was supplied.
    #[error("Not connected: call connect before executing statements")]
    NotConnected,

    /// The selected backend exists as a variant but has no implementation.
    #[error("{0} database connection is not implemented yet")]
    NotImplemented(String),

    /// The source dataset could not be interpreted.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Any other failure.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_backend(message: &str, sql_state: &Option<String>) -> String {
    match sql_state {
        Some(state) => format!("SQL Error {}: {}", state, message),
        None => format!("Database error: {}", message),
    }
}

impl ImportError {
    /// Create a Backend error without a SQLSTATE.
    pub fn backend(message: impl Into<String>) -> Self {
        ImportError::Backend {
            message: message.into(),
            sql_state: None,
        }
    }

    /// Create an UnsupportedType error for the named type.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        ImportError::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// SQLSTATE reported by the driver, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            ImportError::Backend { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ImportError::Config(_) | ImportError::Yaml(_) => EXIT_CONFIG_ERROR,
            ImportError::Backend { .. } | ImportError::NotConnected => EXIT_BACKEND_ERROR,
            ImportError::UnsupportedType { .. }
            | ImportError::RowShape { .. }
            | ImportError::Dataset(_)
            | ImportError::Json(_) => EXIT_DATA_ERROR,
            ImportError::NotImplemented(_) => EXIT_NOT_IMPLEMENTED,
            ImportError::Io(_) => EXIT_IO_ERROR,
            ImportError::Unexpected(_) => EXIT_UNEXPECTED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
