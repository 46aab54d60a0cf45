//! SessionInternals - state handed to the session task
//!
//! The session task owns its `ChatSession` through this struct, along with
//! the channel ends it reads input from and streams output to. Tools receive
//! it mutably so they can touch the shared context and the session's
//! remote threads.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::{
    DeskError, DeskResult, InputMessage, OutputChunk, SessionState, SupportContext,
};
use crate::session::ChatSession;
use crate::tools::ToolResult;

use super::channels::{InputReceiver, OutputSender};

/// Internal state and channels for one chat session
pub struct SessionInternals {
    /// The session's conversation state
    pub session: ChatSession,

    /// ID of the tool call being executed, if any
    pub current_tool_use_id: Option<String>,

    /// Receiver for input messages
    input_rx: InputReceiver,

    /// Sender for output chunks
    output_tx: OutputSender,

    /// Current session state (shared with SessionHandle)
    state: Arc<RwLock<SessionState>>,

    /// When the message being handled arrived
    turn_started: Instant,
}

impl SessionInternals {
    /// Create new session internals.
    ///
    /// This is typically called by `ChatRuntime::spawn()`, not directly.
    pub fn new(
        session: ChatSession,
        input_rx: InputReceiver,
        output_tx: OutputSender,
        state: Arc<RwLock<SessionState>>,
    ) -> Self {
        Self {
            session,
            current_tool_use_id: None,
            input_rx,
            output_tx,
            state,
            turn_started: Instant::now(),
        }
    }

    // =========================================================================
    // Input Methods
    // =========================================================================

    /// Receive the next input message.
    ///
    /// Returns `None` if the input channel is closed (handle dropped).
    pub async fn receive(&mut self) -> Option<InputMessage> {
        self.input_rx.recv().await
    }

    /// Receive the next input message, returning an error if channel closed
    pub async fn receive_or_err(&mut self) -> DeskResult<InputMessage> {
        self.input_rx.recv().await.ok_or(DeskError::ChannelClosed)
    }

    // =========================================================================
    // Output Methods
    // =========================================================================

    /// Send an output chunk to all subscribers.
    ///
    /// Returns the number of subscribers that received it (0 is not an error).
    pub fn send(&self, chunk: OutputChunk) -> usize {
        self.output_tx.send(chunk).unwrap_or(0)
    }

    /// Send a text delta
    pub fn send_text(&self, text: impl Into<String>) -> usize {
        self.send(OutputChunk::TextDelta(text.into()))
    }

    /// Send text complete signal
    pub fn send_text_complete(&self, full_text: impl Into<String>) -> usize {
        self.send(OutputChunk::TextComplete(full_text.into()))
    }

    /// Announce the agent now owning the turn
    pub fn send_agent_updated(&self, agent_name: impl Into<String>) -> usize {
        self.send(OutputChunk::AgentUpdated(agent_name.into()))
    }

    /// Announce a handoff
    pub fn send_handoff(&self, from: impl Into<String>, to: impl Into<String>) -> usize {
        self.send(OutputChunk::Handoff {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Send a status update
    pub fn send_status(&self, status: impl Into<String>) -> usize {
        self.send(OutputChunk::Status(status.into()))
    }

    /// Send an error
    pub fn send_error(&self, error: impl Into<String>) -> usize {
        self.send(OutputChunk::Error(error.into()))
    }

    /// Send done signal
    pub fn send_done(&self) -> usize {
        self.send(OutputChunk::Done)
    }

    /// Send a tool start notification
    pub fn send_tool_start(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> usize {
        self.send(OutputChunk::ToolStart {
            id: id.into(),
            name: name.into(),
            input,
        })
    }

    /// Send incremental tool output
    pub fn send_tool_progress(&self, id: impl Into<String>, output: impl Into<String>) -> usize {
        self.send(OutputChunk::ToolProgress {
            id: id.into(),
            output: output.into(),
        })
    }

    /// Send a tool end notification
    pub fn send_tool_end(&self, id: impl Into<String>, result: ToolResult) -> usize {
        self.send(OutputChunk::ToolEnd {
            id: id.into(),
            result,
        })
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.output_tx.receiver_count()
    }

    // =========================================================================
    // State Methods
    // =========================================================================

    /// Set the current state and notify subscribers
    pub async fn set_state(&self, new_state: SessionState) {
        let mut state = self.state.write().await;
        *state = new_state.clone();
        let _ = self.output_tx.send(OutputChunk::StateChange(new_state));
    }

    /// Set state without notifying subscribers
    pub async fn set_state_silent(&self, new_state: SessionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    /// Get the current state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Set state to Idle
    pub async fn set_idle(&self) {
        self.set_state(SessionState::Idle).await;
    }

    /// Set state to Processing
    pub async fn set_processing(&self) {
        self.set_state(SessionState::Processing).await;
    }

    /// Set state to Done
    pub async fn set_done(&self) {
        self.set_state(SessionState::Done).await;
    }

    /// Set state to Error
    pub async fn set_error(&self, message: impl Into<String>) {
        self.set_state(SessionState::error(message)).await;
    }

    /// Set state to ExecutingTool
    pub async fn set_executing_tool(
        &self,
        tool_name: impl Into<String>,
        tool_use_id: impl Into<String>,
    ) {
        self.set_state(SessionState::executing_tool(tool_name, tool_use_id))
            .await;
    }

    // =========================================================================
    // Session Methods
    // =========================================================================

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    /// The shared conversation context
    pub fn context(&self) -> &SupportContext {
        &self.session.context
    }

    /// Mutable access to the shared conversation context
    pub fn context_mut(&mut self) -> &mut SupportContext {
        &mut self.session.context
    }

    /// Mark the arrival of a new user message
    pub fn start_turn(&mut self) {
        self.turn_started = Instant::now();
    }

    /// Time since the current user message arrived
    pub fn turn_elapsed(&self) -> Duration {
        self.turn_started.elapsed()
    }
}

impl std::fmt::Debug for SessionInternals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInternals")
            .field("session_id", &self.session.session_id)
            .field("current_agent", &self.session.current_agent)
            .field("subscriber_count", &self.output_tx.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_internals;

    #[tokio::test]
    async fn test_receive() {
        let (mut internals, input_tx, _output_rx) = test_internals();

        input_tx.send(InputMessage::user_text("Hello")).await.unwrap();

        let msg = internals.receive().await.unwrap();
        assert!(matches!(msg, InputMessage::UserMessage { text, .. } if text == "Hello"));
    }

    #[tokio::test]
    async fn test_send() {
        let (internals, _input_tx, mut output_rx) = test_internals();

        let count = internals.send_agent_updated("FAQ Agent");
        assert_eq!(count, 1);

        let chunk = output_rx.recv().await.unwrap();
        assert!(matches!(chunk, OutputChunk::AgentUpdated(s) if s == "FAQ Agent"));
    }

    #[tokio::test]
    async fn test_state() {
        let (internals, _input_tx, mut output_rx) = test_internals();

        assert!(matches!(internals.state().await, SessionState::Idle));

        internals.set_processing().await;
        assert!(matches!(internals.state().await, SessionState::Processing));

        let chunk = output_rx.recv().await.unwrap();
        assert!(matches!(chunk, OutputChunk::StateChange(SessionState::Processing)));
    }

    #[tokio::test]
    async fn test_set_state_silent() {
        let (internals, _input_tx, mut output_rx) = test_internals();

        internals.set_state_silent(SessionState::Processing).await;
        assert!(matches!(internals.state().await, SessionState::Processing));

        let result =
            tokio::time::timeout(Duration::from_millis(10), output_rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_context_mut() {
        let (mut internals, _input_tx, _output_rx) = test_internals();

        internals.context_mut().user_id = Some("ID-500".into());
        assert_eq!(internals.context().user_id.as_deref(), Some("ID-500"));
        assert_eq!(internals.session.context.user_id.as_deref(), Some("ID-500"));
    }

    #[tokio::test]
    async fn test_channel_close() {
        let (mut internals, input_tx, _output_rx) = test_internals();
        drop(input_tx);

        assert!(matches!(
            internals.receive_or_err().await,
            Err(DeskError::ChannelClosed)
        ));
    }
}
