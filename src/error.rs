//! Error types for scull
//!
//! Provides a unified error type for all device operations.
//!
//! End-of-data and holes are not errors: both surface as `Ok(0)` from a read.

use std::io;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scull operations
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Locking Errors
    // -------------------------------------------------------------------------
    /// The wait for a device lock was cancelled before the lock was acquired.
    /// No state changed; the same call can be retried.
    #[error("Interrupted while waiting for device lock")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    /// A segment, slot array or block could not be allocated.
    #[error("Out of resources: {0}")]
    OutOfResources(String),

    // -------------------------------------------------------------------------
    // Transfer Errors
    // -------------------------------------------------------------------------
    /// Copying to or from the caller's buffer failed.
    #[error("Transfer fault: {0}")]
    TransferFault(String),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("No such device: index {index} (have {count})")]
    NoSuchDevice { index: usize, count: usize },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ScullError> for io::Error {
    fn from(err: ScullError) -> Self {
        let kind = match err {
            ScullError::Io(e) => return e,
            ScullError::Interrupted => io::ErrorKind::Interrupted,
            ScullError::OutOfResources(_) => io::ErrorKind::OutOfMemory,
            ScullError::TransferFault(_) => io::ErrorKind::InvalidInput,
            ScullError::NoSuchDevice { .. } => io::ErrorKind::NotFound,
            ScullError::AccessDenied(_) => io::ErrorKind::PermissionDenied,
            ScullError::Config(_) => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}
