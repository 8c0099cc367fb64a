//! Error types for marginalia-core

use thiserror::Error;

/// Result type alias for marginalia-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in marginalia-core
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration document is absent, empty, or not a mapping
    #[error("config file is empty or invalid YAML")]
    ConfigEmpty,

    /// One or more structural violations in the configuration
    #[error("config validation failed: {}", errors.join("; "))]
    ConfigInvalid {
        /// Every violation found, in check order
        errors: Vec<String>,
    },

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The CSV dataset could not be read
    #[error("failed to load CSV: {path}: {source}")]
    DataLoad {
        /// Path of the dataset
        path: String,
        /// Underlying IO failure
        source: std::io::Error,
    },

    /// A transform or extraction referenced a column the table does not have
    #[error("unknown column '{column}' in {operation}")]
    UnknownColumn {
        /// Requested column name
        column: String,
        /// Operation that referenced it
        operation: &'static str,
    },

    /// A derived column does not have one value per row
    #[error("column '{column}' has {actual} values but the table has {expected} rows")]
    ColumnLength {
        /// Name of the derived column
        column: String,
        /// Number of rows in the table
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// A filter expression did not match the filter grammar
    #[error("invalid filter expression '{expression}': {message}")]
    FilterParse {
        /// The offending expression
        expression: String,
        /// What the parser expected
        message: String,
    },

    /// Graph construction failed
    #[error("network error: {message}")]
    Network {
        /// Description of the error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The individual validation messages, if this is a validation failure
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::ConfigInvalid { errors } => Some(errors),
            _ => None,
        }
    }
}
