//! # Type-Level Errors
//!
//! Failures raised while encoding/decoding native records or parsing their
//! text forms.

use thiserror::Error;

/// Errors produced by the linear binary codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The leading codec version is not one this crate understands.
    #[error("Unsupported codec version: {0}")]
    UnsupportedVersion(u16),

    /// Input ended before a field could be read.
    #[error("Unexpected end of input: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    UnexpectedEof {
        needed: usize,
        offset: usize,
        remaining: usize,
    },

    /// An interface field carried a type id that is not registered.
    #[error("Unknown {context} type id: {type_id}")]
    UnknownTypeId {
        context: &'static str,
        type_id: u32,
    },

    /// Bytes were left over after the top-level record was decoded.
    #[error("Trailing bytes after decode: {0}")]
    TrailingBytes(usize),

    /// A length prefix claims more data than the input holds.
    #[error("Length prefix {len} exceeds remaining input {remaining}")]
    LengthOverflow { len: usize, remaining: usize },

    /// A string field is not valid UTF-8.
    #[error("Invalid UTF-8 string")]
    InvalidString,

    /// A value cannot be represented by its length prefix.
    #[error("Field {field} too long to encode: {len}")]
    ValueTooLong { field: &'static str, len: usize },
}

/// Errors produced while parsing identifier, address or coin text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Base58 payload could not be decoded.
    #[error("Invalid base58: {0}")]
    InvalidBase58(String),

    /// CB58 checksum did not match the payload.
    #[error("Invalid CB58 checksum")]
    InvalidChecksum,

    /// Decoded payload has the wrong width.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Bech32 string failed to parse or verify.
    #[error("Invalid bech32: {0}")]
    InvalidBech32(String),

    /// Address text has no `<chain>-` prefix.
    #[error("Address missing chain alias: {0}")]
    MissingChainAlias(String),

    /// Node id text is not of the form `NodeID-<cb58>`.
    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    /// Coin identifier text is not of the form `<tx id>:<index>`.
    #[error("Invalid UTXO id: {0}")]
    InvalidUtxoId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::UnknownTypeId {
            context: "block",
            type_id: 99,
        };
        assert_eq!(err.to_string(), "Unknown block type id: 99");
    }

    #[test]
    fn test_format_error_display() {
        let err = FormatError::InvalidLength {
            expected: 32,
            actual: 20,
        };
        assert!(err.to_string().contains("32"));
        assert!(err.to_string().contains("20"));
    }
}
