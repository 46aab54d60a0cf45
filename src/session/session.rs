//! Chat session state
//!
//! The `ChatSession` struct holds everything one user's conversation carries
//! between messages: the owning agent, the item log, the shared context and
//! the remote threads in use.

use chrono::{DateTime, Utc};

use crate::agents::AgentKind;
use crate::core::{DeskError, DeskResult, SupportContext};
use crate::llm::Message;
use crate::threads::{SessionThreads, ThreadService};

/// State of one user's chat, created at chat start and dropped at chat end
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Unique session ID
    pub session_id: String,

    /// Agent that receives the next user message
    pub current_agent: AgentKind,

    /// Every input and output item of the conversation so far
    pub items: Vec<Message>,

    /// Customer facts shared by all agents
    pub context: SupportContext,

    /// Remote threads keyed by remote agent ID
    pub threads: SessionThreads,

    /// When the chat started
    pub created_at: DateTime<Utc>,

    /// Number of user messages handled
    pub turn_count: usize,
}

/// What a failed turn rolls back to
#[derive(Debug, Clone)]
pub struct TurnSnapshot {
    current_agent: AgentKind,
    items_len: usize,
}

impl ChatSession {
    /// Create a session owned by triage, with an empty log and context
    pub fn new(threads: SessionThreads) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), threads)
    }

    /// Create a session with an explicit ID
    pub fn with_id(session_id: impl Into<String>, threads: SessionThreads) -> Self {
        Self {
            session_id: session_id.into(),
            current_agent: AgentKind::Triage,
            items: Vec::new(),
            context: SupportContext::new(),
            threads,
            created_at: Utc::now(),
            turn_count: 0,
        }
    }

    /// Start a chat: open one remote thread per remote agent, then create
    /// the session around them
    pub async fn start(
        service: &dyn ThreadService,
        remote_agent_ids: &[String],
    ) -> DeskResult<Self> {
        let threads = SessionThreads::open(service, remote_agent_ids)
            .await
            .map_err(|e| DeskError::Remote(format!("{:#}", e)))?;
        let session = Self::new(threads);
        tracing::info!("[ChatSession] Started session {}", session.session_id);
        Ok(session)
    }

    /// Append a user message to the item log
    pub fn push_user_input(&mut self, text: impl Into<String>) {
        self.items.push(Message::user(text));
        self.turn_count += 1;
    }

    /// Capture the state a failed turn must not change
    pub fn snapshot(&self) -> TurnSnapshot {
        TurnSnapshot {
            current_agent: self.current_agent,
            items_len: self.items.len(),
        }
    }

    /// Roll ownership and the item log back to a snapshot.
    ///
    /// Context changes made during the turn are kept.
    pub fn restore(&mut self, snapshot: TurnSnapshot) {
        self.current_agent = snapshot.current_agent;
        self.items.truncate(snapshot.items_len);
    }

    /// The conversation history
    pub fn history(&self) -> &[Message] {
        &self.items
    }
}
