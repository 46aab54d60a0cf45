//! Input and output message types for session communication

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::SessionState;
use crate::tools::ToolResult;

/// File attached to a user message by the chat UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Local path of the uploaded file
    pub path: String,
    /// MIME type reported by the UI
    pub mime: String,
}

impl Attachment {
    /// Create an attachment, guessing the MIME type from the path
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self { path, mime }
    }

    /// Whether this attachment is an image
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Messages that can be sent TO a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputMessage {
    /// A chat message from the user
    UserMessage {
        /// Text typed by the user
        text: String,
        /// Files uploaded with the message
        attachments: Vec<Attachment>,
    },

    /// End the chat session
    Shutdown,
}

impl InputMessage {
    /// Create a plain text user message
    pub fn user_text(text: impl Into<String>) -> Self {
        InputMessage::UserMessage {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Text handed to the agents: the typed text followed by one
    /// `[uploaded image]` line per image attachment.
    pub fn compose_user_input(text: &str, attachments: &[Attachment]) -> String {
        let mut input = text.to_string();
        for attachment in attachments.iter().filter(|a| a.is_image()) {
            input.push_str(&format!("\n[uploaded image] {}", attachment.path));
        }
        input
    }
}

/// Output chunks streamed FROM a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputChunk {
    /// The agent owning the conversation for this turn (sent at turn start
    /// and after every handoff)
    AgentUpdated(String),

    /// Conversation ownership moved between agents
    Handoff {
        /// Previous owner
        from: String,
        /// New owner
        to: String,
    },

    // --- Text Streaming ---
    /// Incremental text output
    TextDelta(String),

    /// Complete text block
    TextComplete(String),

    // --- Tool Execution ---
    /// Tool execution starting
    ToolStart {
        /// Tool use ID
        id: String,
        /// Tool name
        name: String,
        /// Tool input
        input: Value,
    },

    /// Incremental tool output (the FAQ agent's streamed answer)
    ToolProgress {
        /// Tool use ID
        id: String,
        /// Progress output
        output: String,
    },

    /// Tool execution completed
    ToolEnd {
        /// Tool use ID
        id: String,
        /// Tool result
        result: ToolResult,
    },

    // --- State & Status ---
    /// Session state changed
    StateChange(SessionState),

    /// Status update
    Status(String),

    // --- Completion ---
    /// The turn failed; carries the text to show the user
    Error(String),

    /// Turn complete
    Done,
}

impl OutputChunk {
    /// Create a text delta chunk
    pub fn text(text: impl Into<String>) -> Self {
        OutputChunk::TextDelta(text.into())
    }

    /// Create an error chunk
    pub fn error(msg: impl Into<String>) -> Self {
        OutputChunk::Error(msg.into())
    }

    /// Check if this is a terminal chunk
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputChunk::Done | OutputChunk::Error(_))
    }

    /// Check if this is a text-related chunk
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            OutputChunk::TextDelta(_) | OutputChunk::TextComplete(_)
        )
    }

    /// Check if this is a tool-related chunk
    pub fn is_tool(&self) -> bool {
        matches!(
            self,
            OutputChunk::ToolStart { .. }
                | OutputChunk::ToolProgress { .. }
                | OutputChunk::ToolEnd { .. }
        )
    }
}
