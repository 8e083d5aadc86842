//! Decode error types
//!
//! Low-level readers report [`ChunkError`]; the structured-text parser reports
//! [`TextEngineError`]. Callers of the decoder only ever see [`DecodeError`],
//! which carries the low-level cause as its source.

use std::io;
use thiserror::Error;

/// Structural failures raised while walking the binary layout
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEof { offset: u64, wanted: u64 },

    #[error("Unexpected value for {field}: expected {expected}, found {found}")]
    Mismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Invalid length for {field}: {length}")]
    InvalidLength { field: &'static str, length: i64 },
}

/// Failures raised by the engine-data text parser
#[derive(Error, Debug)]
pub enum TextEngineError {
    #[error("Invalid number literal: {0:?}")]
    InvalidNumber(String),
}

/// The single error surfaced by [`crate::decoder::Decoder::decode`]
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Error while decoding PSD stream: {0}")]
    Malformed(#[source] ChunkError),

    #[error("Error while decoding PSD stream: {0}")]
    TextEngine(#[source] TextEngineError),

    #[error("Error while decoding PSD stream: {0}")]
    Io(#[source] io::Error),
}

impl From<ChunkError> for DecodeError {
    fn from(err: ChunkError) -> Self {
        DecodeError::Malformed(err)
    }
}

impl From<TextEngineError> for DecodeError {
    fn from(err: TextEngineError) -> Self {
        DecodeError::TextEngine(err)
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Io(err)
    }
}

impl From<DecodeError> for String {
    fn from(err: DecodeError) -> Self {
        err.to_string()
    }
}
