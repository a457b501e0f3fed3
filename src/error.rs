//! Error types for the SMC exporter
//!
//! Provides structured error types for all exporter components including
//! the hardware gateway, label configuration, and metrics exposition.

use thiserror::Error;

/// Unified error type for the exporter
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Hardware Gateway Errors
    // =========================================================================
    #[error("SMC hardware error: {0}")]
    Hardware(String),

    #[error("SMC call failed: {op} returned {code:#010x}")]
    SmcCall { op: &'static str, code: i32 },

    #[error("SMC is not available on this platform")]
    Unsupported,

    // =========================================================================
    // System Info Errors
    // =========================================================================
    #[error("uname system call failed")]
    Uname,

    // =========================================================================
    // Metrics Errors
    // =========================================================================
    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is transient. Transient errors fail a single
    /// scrape; the next scrape retries from scratch.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Hardware(_) | Error::SmcCall { .. } | Error::Uname
        )
    }

    /// Check if this error should abort startup. Configuration problems are
    /// never retried; the process exits instead of serving broken scrapes.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::JsonParse(_) | Error::Metrics(_)
        )
    }
}

/// Result type alias for the exporter
pub type Result<T> = std::result::Result<T, Error>;
