//! Error types for tabrecon operations

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

/// Which dataset a column reference belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSide {
    Source,
    Target,
}

impl fmt::Display for ColumnSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSide::Source => write!(f, "source"),
            ColumnSide::Target => write!(f, "target"),
        }
    }
}

/// Caller-input errors raised while resolving a column mapping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Unknown {side} column: {column}")]
    UnknownColumn { column: String, side: ColumnSide },

    #[error("Target column '{target}' is mapped from more than one source column")]
    DuplicateTarget { target: String },

    #[error("Source column '{column}' is mapped to more than one target column")]
    DuplicateSource { column: String },

    #[error("Key column '{column}' is not part of the column mapping")]
    UnmappedKey { column: String },

    #[error("Column mapping is empty: at least one mapped column pair is required")]
    EmptyMapping,
}

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Result not found: {handle}")]
    NotFound { handle: String },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Data processing error: {message}")]
    DataProcessing { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl ReconError {
    pub fn not_found(handle: impl Into<String>) -> Self {
        Self::NotFound {
            handle: handle.into(),
        }
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn data_processing(msg: impl Into<String>) -> Self {
        Self::DataProcessing {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// True for errors caused by caller input rather than the environment
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Mapping(_) | Self::NotFound { .. } | Self::InvalidInput { .. }
        )
    }
}
