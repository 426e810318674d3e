use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file extension '{extension}', expected .csv or .txt")]
    UnsupportedExtension { extension: String },

    #[error("file is {size} bytes, which exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("file is not valid UTF-8 text: {0}")]
    InvalidUtf8(String),

    #[error("input contains no data after removing blank lines")]
    EmptyInput,

    #[error("column mapping is invalid: {0}")]
    Mapping(#[from] MappingError),

    #[error("unknown coordinate system: {name}")]
    UnknownSystem { name: String },

    #[error("no table is loaded")]
    NoTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("the {role} column is not assigned")]
    MissingRole { role: &'static str },

    #[error("column '{header}' is assigned to more than one role")]
    DuplicateColumn { header: String },

    #[error("column '{header}' does not exist in the table headers")]
    UnknownColumn { header: String },
}

/// Failure reported by the projection primitive for a single point. The
/// message travels verbatim into the per-row result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
