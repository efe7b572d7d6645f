// Error types for Server module
#![allow(dead_code)]

use thiserror::Error;

/// Server runtime errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to decode request: {0}")]
    DecodeError(String),

    #[error("Failed to encode response: {0}")]
    EncodeError(String),

    #[error("Request line is not valid UTF-8")]
    InvalidUtf8,

    #[error("Request line too long: {0} bytes")]
    LineTooLong(usize),

    #[error("Response writer closed")]
    WriterClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
