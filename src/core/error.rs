//! Desk error types

use thiserror::Error;

/// Errors that can occur while running a support session
#[derive(Error, Debug)]
pub enum DeskError {
    /// Session not found in the runtime
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    ChannelClosed,

    /// Send error on channel
    #[error("Failed to send message: {0}")]
    SendError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tool execution error
    #[error("Tool error: {0}")]
    ToolError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A handoff was requested along an edge the graph does not declare
    #[error("Handoff rejected: {from} cannot transfer to {to}")]
    HandoffRejected {
        /// Agent that asked for the transfer
        from: String,
        /// Requested target
        to: String,
    },

    /// Hosted agent service returned an error
    #[error("Agent service error: {0}")]
    Remote(String),

    /// A turn made more model calls than allowed
    #[error("Max turns ({0}) exceeded")]
    MaxTurnsExceeded(usize),

    /// Session shutdown requested
    #[error("Session shutdown")]
    Shutdown,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl DeskError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        DeskError::Other(msg.into())
    }

    /// Create a tool error
    pub fn tool_error(msg: impl Into<String>) -> Self {
        DeskError::ToolError(msg.into())
    }

    /// Create a missing-variable configuration error
    pub fn missing_var(name: &str) -> Self {
        DeskError::InvalidConfig(format!("{} environment variable not set", name))
    }
}

/// Result type alias for desk operations
pub type DeskResult<T> = Result<T, DeskError>;
