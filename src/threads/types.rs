//! Agent-service wire types and run-stream event parsing

use serde::{Deserialize, Serialize};

/// Thread object returned by `POST /threads`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadObject {
    /// Thread ID
    pub id: String,
}

/// Body of `POST /threads/{id}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest<'a> {
    /// Always "user" here
    pub role: &'a str,
    /// Message text
    pub content: &'a str,
}

/// Body of `POST /threads/{id}/runs`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest<'a> {
    /// Remote agent to run
    pub assistant_id: &'a str,
    /// Stream events back as SSE
    pub stream: bool,
}

/// Page of thread messages
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    /// Messages, newest first when requested with `order=desc`
    pub data: Vec<ThreadMessage>,
}

/// A message stored in a remote thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    /// Message ID
    pub id: String,
    /// "user" or "assistant"
    pub role: String,
    /// Content parts
    #[serde(default)]
    pub content: Vec<MessagePart>,
}

impl ThreadMessage {
    /// Concatenated text of the message, if it has any text part
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.value.as_str()),
                MessagePart::Unknown => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }
}

impl MessageList {
    /// Most recent agent message that carries text
    pub fn last_agent_text(&self) -> Option<String> {
        self.data
            .iter()
            .filter(|m| m.role == "assistant")
            .find_map(|m| m.text())
    }
}

/// Content part of a thread message or message delta
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum MessagePart {
    /// Text part
    #[serde(rename = "text")]
    Text {
        /// Text payload
        text: TextValue,
    },
    /// Image files and other parts
    #[serde(other)]
    Unknown,
}

/// Text payload of a content part
#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    /// The text (or a fragment of it, in deltas)
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaData {
    delta: MessageDeltaBody,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct RunData {
    #[serde(default)]
    last_error: Option<RunError>,
}

/// Error attached to a failed run
#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    #[serde(default)]
    error: Option<RunError>,
    #[serde(default)]
    message: Option<String>,
}

/// Event observed on a streamed run
#[derive(Debug, Clone, PartialEq)]
pub enum RunStreamEvent {
    /// Text fragment of the agent's reply
    MessageDelta(String),
    /// The run failed; carries the run's last error if reported
    RunFailed(Option<String>),
    /// The service reported a stream error
    Error(String),
    /// Stream finished
    Done,
    /// Any other event (run status changes, step events)
    Other(String),
}

/// Parse one SSE event from a run stream.
///
/// `event` is the SSE event name, `data` its payload.
pub fn parse_run_event(event: &str, data: &str) -> RunStreamEvent {
    match event {
        "thread.message.delta" => match serde_json::from_str::<MessageDeltaData>(data) {
            Ok(d) => {
                let text: String = d
                    .delta
                    .content
                    .iter()
                    .filter_map(|p| match p {
                        MessagePart::Text { text } => Some(text.value.as_str()),
                        MessagePart::Unknown => None,
                    })
                    .collect();
                RunStreamEvent::MessageDelta(text)
            }
            Err(e) => {
                tracing::warn!("[AgentService] Unparseable message delta: {}", e);
                RunStreamEvent::Other(event.to_string())
            }
        },
        "thread.run.failed" => {
            let last_error = serde_json::from_str::<RunData>(data)
                .ok()
                .and_then(|r| r.last_error)
                .map(|e| e.to_string());
            RunStreamEvent::RunFailed(last_error)
        }
        "error" => {
            let message = serde_json::from_str::<ErrorData>(data)
                .ok()
                .and_then(|e| e.error.map(|r| r.to_string()).or(e.message))
                .unwrap_or_else(|| data.to_string());
            RunStreamEvent::Error(message)
        }
        "done" => RunStreamEvent::Done,
        other => RunStreamEvent::Other(other.to_string()),
    }
}
