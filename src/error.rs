//! # Error Types
//!
//! Custom error types for VTX Sync using `thiserror`.

use thiserror::Error;

/// Main error type for VTX Sync
#[derive(Debug, Error)]
pub enum VtxSyncError {
    /// CRSF framing errors
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No ELRS serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VTX Sync
pub type Result<T> = std::result::Result<T, VtxSyncError>;
