//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`NotConfigured`] thrown when the remote store has no credentials.
//! - [`Open`] thrown when the remote table cannot be located or created.
//! - [`Read`] thrown when rows cannot be read back for a query.
//! - [`Write`] thrown when the batch append fails.
//! - [`InvalidBatch`] thrown when a sync batch exceeds the allowed size.
//!
//!  [`NotConfigured`]: EngineError::NotConfigured
//!  [`Open`]: EngineError::Open
//!  [`Read`]: EngineError::Read
//!  [`Write`]: EngineError::Write
//!  [`InvalidBatch`]: EngineError::InvalidBatch
use thiserror::Error;

use crate::store::StoreError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("remote store not configured: {0}")]
    NotConfigured(String),
    #[error("failed to open remote store: {0}")]
    Open(StoreError),
    #[error("failed to read rows: {0}")]
    Read(StoreError),
    #[error("failed to append rows: {0}")]
    Write(StoreError),
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
}

impl EngineError {
    /// Wraps an open error, keeping `NotConfigured` distinct.
    pub(crate) fn open(err: StoreError) -> Self {
        match err {
            StoreError::NotConfigured(msg) => Self::NotConfigured(msg),
            other => Self::Open(other),
        }
    }

    /// Wraps a read-side store error, keeping `NotConfigured` distinct.
    pub(crate) fn read(err: StoreError) -> Self {
        match err {
            StoreError::NotConfigured(msg) => Self::NotConfigured(msg),
            other => Self::Read(other),
        }
    }

    /// Wraps a write-side store error, keeping `NotConfigured` distinct.
    pub(crate) fn write(err: StoreError) -> Self {
        match err {
            StoreError::NotConfigured(msg) => Self::NotConfigured(msg),
            other => Self::Write(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotConfigured(a), Self::NotConfigured(b)) => a == b,
            (Self::Open(a), Self::Open(b)) => a.to_string() == b.to_string(),
            (Self::Read(a), Self::Read(b)) => a.to_string() == b.to_string(),
            (Self::Write(a), Self::Write(b)) => a.to_string() == b.to_string(),
            (Self::InvalidBatch(a), Self::InvalidBatch(b)) => a == b,
            _ => false,
        }
    }
}
