//! Error types for fifolog
//!
//! Provides a unified error type for all store operations.
//!
//! An empty store is not an error: operations that find nothing to return
//! answer `Ok(None)`, `Ok(0)` or an empty `Vec` instead.

use thiserror::Error;

/// Result type alias using FifoLogError
pub type Result<T> = std::result::Result<T, FifoLogError>;

/// Unified error type for fifolog operations
#[derive(Debug, Error)]
pub enum FifoLogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Index {index} out of bounds (size {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("Log ended before live record {index}")]
    ShortRead { index: usize },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
