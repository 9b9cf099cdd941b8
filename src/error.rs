//! Error types for dbwire
//!
//! Provides a unified error type for all client and replay operations.

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Unified error type for dbwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Local file I/O (WAL files, directories)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// Connect, read or write on an engine socket failed, or the engine
    /// closed the socket before replying
    #[error("engine transport error: {0}")]
    Transport(String),

    /// Reply bytes could not be deserialized
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    /// A send was attempted on a connection that already has a request in flight
    #[error("socket busy")]
    SocketBusy,

    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Replay Errors
    // -------------------------------------------------------------------------
    #[error("Replay error: {0}")]
    Replay(String),
}

impl WireError {
    /// Wrap a socket-level failure
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        WireError::Transport(err.to_string())
    }

    /// True for failures that happened on the wire rather than in the reply
    pub fn is_transport(&self) -> bool {
        matches!(self, WireError::Transport(_))
    }
}
