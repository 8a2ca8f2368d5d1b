//! Unified error hierarchy for sportrs
//!
//! Provides a structured error type system with severity levels,
//! user-facing messages, and integration with the tracing system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all sportrs operations
#[derive(Debug, Error)]
pub enum SportRsError {
    /// File import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while reading and normalizing an input file
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Extension not handled by any importer
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// File exists but its content could not be decoded
    #[error("Corrupted file {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Required canonical columns could not be resolved against the
    /// file's headers; the caller must supply a manual mapping override
    #[error("Missing required columns: {}", fields.join(", "))]
    MissingColumns { fields: Vec<String> },

    /// No sample in the file carried a usable timestamp
    #[error("No valid timestamps in {path}")]
    NoTimestamps { path: PathBuf },

    /// File contained a header row but no usable data rows
    #[error("No usable rows in {path}")]
    EmptyFile { path: PathBuf },
}

/// Result type alias for sportrs operations
pub type Result<T> = std::result::Result<T, SportRsError>;

impl SportRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SportRsError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            SportRsError::Import(ImportError::MissingColumns { .. }) => ErrorSeverity::Warning,
            SportRsError::Import(ImportError::NoTimestamps { .. }) => ErrorSeverity::Warning,
            SportRsError::Import(ImportError::EmptyFile { .. }) => ErrorSeverity::Warning,
            SportRsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SportRsError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find activity file: {}", path.display())
            }
            SportRsError::Import(ImportError::Corrupted { path, reason }) => {
                format!("Activity file {} is corrupted: {}", path.display(), reason)
            }
            SportRsError::Import(ImportError::MissingColumns { fields }) => {
                format!(
                    "Could not locate the column(s) {} in this file. Map them manually with --map.",
                    fields.join(", ")
                )
            }
            SportRsError::Import(ImportError::NoTimestamps { path }) => {
                format!(
                    "{} contains no samples with a valid timestamp and was skipped.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
