//! SessionHandle - the UI's end of a running chat session

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::{Attachment, DeskError, DeskResult, InputMessage, SessionState};

use super::channels::{InputSender, OutputReceiver, OutputSender};

/// Handle for interacting with a running chat session.
///
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct SessionHandle {
    /// Session ID
    session_id: String,

    /// Sender for input messages (to the session task)
    input_tx: InputSender,

    /// Sender for output (for subscribing)
    output_tx: OutputSender,

    /// Current session state
    state: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    /// Create a new session handle.
    ///
    /// This is typically called by `ChatRuntime::spawn()`, not directly.
    pub fn new(
        session_id: impl Into<String>,
        input_tx: InputSender,
        output_tx: OutputSender,
        state: Arc<RwLock<SessionState>>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            input_tx,
            output_tx,
            state,
        }
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    // =========================================================================
    // Input Methods
    // =========================================================================

    /// Send a plain text message
    pub async fn send_message(&self, text: impl Into<String>) -> DeskResult<()> {
        self.send(InputMessage::user_text(text)).await
    }

    /// Send a message with uploaded files
    pub async fn send_message_with_attachments(
        &self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> DeskResult<()> {
        self.send(InputMessage::UserMessage {
            text: text.into(),
            attachments,
        })
        .await
    }

    /// End the chat
    pub async fn shutdown(&self) -> DeskResult<()> {
        self.send(InputMessage::Shutdown).await
    }

    /// Send any input message to the session
    pub async fn send(&self, message: InputMessage) -> DeskResult<()> {
        self.input_tx
            .send(message)
            .await
            .map_err(|_| DeskError::ChannelClosed)
    }

    /// Try to send input without waiting
    pub fn try_send(&self, message: InputMessage) -> DeskResult<()> {
        self.input_tx.try_send(message).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => {
                DeskError::SendError("Channel full".into())
            }
            tokio::sync::mpsc::error::TrySendError::Closed(_) => DeskError::ChannelClosed,
        })
    }

    // =========================================================================
    // Output Methods
    // =========================================================================

    /// Subscribe to session output from this point forward
    pub fn subscribe(&self) -> OutputReceiver {
        self.output_tx.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.output_tx.receiver_count()
    }

    // =========================================================================
    // State Methods
    // =========================================================================

    /// Get the current session state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Check if the session is waiting for input
    pub async fn is_idle(&self) -> bool {
        matches!(*self.state.read().await, SessionState::Idle)
    }

    /// Check if the session has ended
    pub async fn is_done(&self) -> bool {
        matches!(*self.state.read().await, SessionState::Done)
    }

    /// Check if the session is still running (not done and not errored)
    pub async fn is_running(&self) -> bool {
        !self.state.read().await.is_terminal()
    }

    /// Wait until the session reaches a terminal state
    pub async fn wait_for_completion(&self) {
        while self.is_running().await {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("subscriber_count", &self.output_tx.receiver_count())
            .finish()
    }
}
