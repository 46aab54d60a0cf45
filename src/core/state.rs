//! Session state types

use serde::{Deserialize, Serialize};

/// Current state of a chat session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for the next user message
    #[default]
    Idle,

    /// Running a turn (calling the model)
    Processing,

    /// Executing a tool
    ExecutingTool {
        /// Name of the tool being executed
        tool_name: String,
        /// ID of the tool use
        tool_use_id: String,
    },

    /// Session has ended
    Done,

    /// Session task failed
    Error {
        /// Error message
        message: String,
    },
}

impl SessionState {
    /// Check if the session is in a terminal state (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Error { .. })
    }

    /// Check if the session is actively processing
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Processing | SessionState::ExecutingTool { .. }
        )
    }

    /// Create an error state
    pub fn error(msg: impl Into<String>) -> Self {
        SessionState::Error {
            message: msg.into(),
        }
    }

    /// Create an executing tool state
    pub fn executing_tool(name: impl Into<String>, id: impl Into<String>) -> Self {
        SessionState::ExecutingTool {
            tool_name: name.into(),
            tool_use_id: id.into(),
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Processing => write!(f, "Processing"),
            SessionState::ExecutingTool { tool_name, .. } => {
                write!(f, "Executing tool: {}", tool_name)
            }
            SessionState::Done => write!(f, "Done"),
            SessionState::Error { message } => write!(f, "Error: {}", message),
        }
    }
}
