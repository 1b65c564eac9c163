// Centralized error handling module
// Error types with path and operation context for every inventory operation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the inventory pipeline
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Session descriptor is malformed or incomplete
    #[error("Invalid session descriptor {path}: {reason}\nSuggestion: Pass the hashtally.config file of a session created by a fresh run")]
    Config { path: PathBuf, reason: String },

    /// Target is neither a regular file nor a directory
    #[error("Target is not a valid file or directory: {path}\nSuggestion: Check that the path exists and is accessible")]
    InvalidTarget { path: PathBuf },

    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Use one of MD5, SHA1, SHA224, SHA256, SHA384, SHA512")]
    UnsupportedAlgorithm { algorithm: String },

    /// Session timestamp does not follow the session datetime format
    #[error("Invalid session datetime '{datetime}': {reason}\nSuggestion: Use the form YYYY-MM-DD@HH-MM-SS")]
    InvalidDatetime { datetime: String, reason: String },

    /// A fresh run would overwrite the descriptor of an existing session
    #[error("Session already exists: {path}\nSuggestion: Resume it by passing its hashtally.config, or wait a second and retry")]
    SessionExists { path: PathBuf },

    #[error("File not found: {path}\nSuggestion: Check that the file path is correct and the file exists")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied while {operation} {path}\nSuggestion: Check file permissions or run with appropriate privileges")]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("{}", io_message(.path, .operation, .source))]
    Io {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed table {path}: {source}\nSuggestion: Check that the file was written by hashtally and is not being edited")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn io_message(path: &Option<PathBuf>, operation: &str, source: &io::Error) -> String {
    match path {
        Some(p) => format!(
            "I/O error while {} {}: {}\nSuggestion: Check file permissions and disk space",
            operation,
            p.display(),
            source
        ),
        None => format!(
            "I/O error while {}: {}\nSuggestion: Check file permissions and disk space",
            operation, source
        ),
    }
}

impl InventoryError {
    /// Create an error from an io::Error with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(path)) => InventoryError::FileNotFound { path },
            (io::ErrorKind::PermissionDenied, Some(path)) => InventoryError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            (_, path) => InventoryError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    pub fn from_csv_error(err: csv::Error, path: PathBuf) -> Self {
        InventoryError::Csv { path, source: err }
    }

    /// Target path, algorithm or timestamp failed validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InventoryError::InvalidTarget { .. }
                | InventoryError::UnsupportedAlgorithm { .. }
                | InventoryError::InvalidDatetime { .. }
        )
    }

    /// Session descriptor could not be used
    pub fn is_config(&self) -> bool {
        matches!(self, InventoryError::Config { .. })
    }
}

impl From<io::Error> for InventoryError {
    fn from(err: io::Error) -> Self {
        InventoryError::from_io_error(err, "unknown operation", None)
    }
}
