//! Error types for kvbridge
//!
//! Provides a unified error type for all runtime operations.

use thiserror::Error;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type for kvbridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    // -------------------------------------------------------------------------
    // Version Selection Errors
    // -------------------------------------------------------------------------
    #[error("API version has not been selected")]
    VersionNotSelected,

    #[error("API version {existing} already selected, cannot select {requested}")]
    VersionAlreadySelected { existing: i32, requested: i32 },

    #[error("API version {requested} is not supported (supported: {min}..={max})")]
    VersionUnsupported { requested: i32, min: i32, max: i32 },

    #[error("Engine rejected API version negotiation (code {0})")]
    EngineNegotiationFailed(i32),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network has been stopped and cannot be restarted")]
    NetworkStopped,

    #[error("Engine network call {phase} failed (code {code})")]
    EngineSetupFailed { code: i32, phase: &'static str },

    #[error("Operation cannot run on the network thread")]
    OnNetworkThread,

    // -------------------------------------------------------------------------
    // Future Errors
    // -------------------------------------------------------------------------
    #[error("Engine call failed (code {0})")]
    EngineCallFailed(i32),

    #[error("Engine result extraction failed (code {0})")]
    EngineExtractFailed(i32),

    #[error("Future is not ready")]
    FutureNotReady,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid network option: {0}")]
    InvalidOption(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Native status code carried by this error, if any
    pub fn code(&self) -> Option<i32> {
        match self {
            BridgeError::EngineNegotiationFailed(code)
            | BridgeError::EngineCallFailed(code)
            | BridgeError::EngineExtractFailed(code) => Some(*code),
            BridgeError::EngineSetupFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}
