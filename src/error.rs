//! Error types for CaskDB
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for CaskDB operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// A timestamp or length does not fit in its 4-byte header field
    #[error("Encoding overflow: {field} = {value} does not fit in 4 bytes")]
    EncodingOverflow { field: &'static str, value: u64 },

    /// Key or value contains non 7-bit characters
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store corruption detected at offset {offset}: {reason}")]
    CorruptStore { offset: u64, reason: String },

    #[error("Store is closed")]
    StoreClosed,

    #[error("Store file already open: {}", .0.display())]
    AlreadyOpen(PathBuf),
}
