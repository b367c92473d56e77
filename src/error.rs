//! Error types for the index core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Column Definition for {0} not found")]
    UnknownColumn(String),

    #[error("Malformed mapping: {0}")]
    MalformedMapping(#[from] serde_json::Error),

    #[error("Unsupported validator for column {column}: {validator}")]
    UnsupportedValidator { column: String, validator: String },

    #[error("Cannot decode {validator} value: {reason}")]
    DecodingMismatch { validator: String, reason: String },

    #[error("Index option '{0}' not found")]
    MissingOption(String),

    #[error("Unknown analyzer: {0}")]
    UnknownAnalyzer(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl IndexError {
    /// Stable error code, surfaced to the host alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::UnknownColumn(_) => "UNKNOWN_COLUMN",
            IndexError::MalformedMapping(_) => "MALFORMED_MAPPING",
            IndexError::UnsupportedValidator { .. } => "UNSUPPORTED_VALIDATOR",
            IndexError::DecodingMismatch { .. } => "DECODING_MISMATCH",
            IndexError::MissingOption(_) => "MISSING_OPTION",
            IndexError::UnknownAnalyzer(_) => "UNKNOWN_ANALYZER",
            IndexError::InvalidType(_) => "INVALID_TYPE",
            IndexError::InvalidFormat(_) => "INVALID_FORMAT",
        }
    }

    /// Configuration errors are fatal at index creation and never retried.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            IndexError::DecodingMismatch { .. } | IndexError::InvalidFormat(_)
        )
    }

    pub(crate) fn decoding(validator: impl ToString, reason: impl Into<String>) -> Self {
        IndexError::DecodingMismatch {
            validator: validator.to_string(),
            reason: reason.into(),
        }
    }
}
