//! # Domain Errors
//!
//! Error taxonomy for the adapter. Every failure maps to one [`ErrorKind`] so
//! the API layer can pick a wire code without matching on variants.

use pchain_types::{CodecError, FormatError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification used by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Remote node unreachable or returned an error. Retry is the caller's call.
    Client,
    /// Malformed bytes, unknown variant or codec version.
    Decode,
    /// The request itself is wrong; the message says which operation and field.
    Validation,
    /// Genesis or chain time not bootstrapped yet.
    Uninitialized,
}

/// Adapter error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Transport or remote failure.
    #[error("Client error: {0}")]
    Client(String),

    /// Bytes could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// Invalid request input.
    #[error("Invalid {field}{}: {reason}", at_index(.index))]
    Validation {
        /// Operation (or input/signature) position, when one applies.
        index: Option<usize>,
        field: String,
        reason: String,
    },

    /// Operation type is unknown or cannot be constructed.
    #[error("Unsupported operation type: {0}")]
    UnsupportedOperation(String),

    /// Called before `initialize`.
    #[error("Not initialized: {0}")]
    Uninitialized(&'static str),
}

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" at index {}", index),
        None => String::new(),
    }
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(_) => ErrorKind::Client,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Validation { .. } | Self::UnsupportedOperation(_) => ErrorKind::Validation,
            Self::Uninitialized(_) => ErrorKind::Uninitialized,
        }
    }

    /// Validation failure tied to one operation.
    pub fn invalid_op(index: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            index: Some(index),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Validation failure not tied to a position.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            index: None,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn client(reason: impl std::fmt::Display) -> Self {
        Self::Client(reason.to_string())
    }
}

impl From<FormatError> for AdapterError {
    fn from(err: FormatError) -> Self {
        Self::invalid("format", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AdapterError::client("down").kind(), ErrorKind::Client);
        assert_eq!(
            AdapterError::from(CodecError::TrailingBytes(1)).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            AdapterError::UnsupportedOperation("MINT".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AdapterError::Uninitialized("genesis").kind(),
            ErrorKind::Uninitialized
        );
    }

    #[test]
    fn test_validation_display_names_position() {
        let err = AdapterError::invalid_op(3, "coin_change", "missing");
        assert_eq!(err.to_string(), "Invalid coin_change at index 3: missing");

        let err = AdapterError::invalid("signatures", "2 unused");
        assert_eq!(err.to_string(), "Invalid signatures: 2 unused");
    }
}
