//! ChatRuntime - Spawns and manages chat session tasks
//!
//! The `ChatRuntime` is responsible for:
//! - Spawning each chat session as a tokio task
//! - Creating channels and returning handles
//! - Tracking running sessions
//! - Providing shutdown methods

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::{DeskError, DeskResult, SessionState};
use crate::session::ChatSession;

use super::channels::create_session_channels;
use super::handle::SessionHandle;
use super::internals::SessionInternals;

/// Runtime for spawning and managing chat sessions.
///
/// Sessions are fully independent; they share nothing but this registry.
#[derive(Clone)]
pub struct ChatRuntime {
    /// Map of session_id -> SessionHandle for running sessions
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl ChatRuntime {
    /// Create a new runtime
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn a new session task.
    ///
    /// The `session_fn` receives `SessionInternals` and runs the session.
    /// Returns a `SessionHandle` for the UI.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let runtime = ChatRuntime::new();
    /// let session = ChatSession::start(service.as_ref(), &[faq_agent_id]).await?;
    /// let desk = Arc::new(SupportDesk::new(llm, graph, service, config));
    ///
    /// let handle = runtime
    ///     .spawn(session, move |internals| async move { desk.run(internals).await })
    ///     .await;
    /// ```
    pub async fn spawn<F, Fut>(&self, session: ChatSession, session_fn: F) -> SessionHandle
    where
        F: FnOnce(SessionInternals) -> Fut + Send + 'static,
        Fut: Future<Output = DeskResult<()>> + Send + 'static,
    {
        let session_id = session.session_id.clone();

        let (input_tx, input_rx, output_tx) = create_session_channels();
        let state = Arc::new(RwLock::new(SessionState::Idle));

        let internals = SessionInternals::new(session, input_rx, output_tx.clone(), state.clone());
        let handle = SessionHandle::new(session_id.clone(), input_tx, output_tx, state.clone());

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle.clone());
        }

        let sessions_ref = self.sessions.clone();
        tokio::spawn(async move {
            let result = session_fn(internals).await;

            if let Err(e) = result {
                tracing::error!(session_id = %session_id, error = %e, "Session task errored");
                *state.write().await = SessionState::error(e.to_string());
            }

            let mut sessions = sessions_ref.write().await;
            sessions.remove(&session_id);

            tracing::debug!(session_id = %session_id, "Session task completed");
        });

        handle
    }

    /// Get a handle to a running session
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Check if a session is running
    pub async fn is_running(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(session_id)
    }

    /// Get the number of running sessions
    pub async fn count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// List all running session IDs
    pub async fn list_running(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    /// Shutdown a specific session
    pub async fn shutdown(&self, session_id: &str) -> DeskResult<()> {
        let handle = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };

        match handle {
            Some(h) => h.shutdown().await,
            None => Err(DeskError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Shutdown all running sessions
    pub async fn shutdown_all(&self) -> Vec<(String, DeskResult<()>)> {
        let session_ids = self.list_running().await;
        let mut results = Vec::new();

        for session_id in session_ids {
            let result = self.shutdown(&session_id).await;
            results.push((session_id, result));
        }

        results
    }

    /// Wait for a specific session to complete
    pub async fn wait_for(&self, session_id: &str) {
        while self.is_running(session_id).await {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }
}

impl Default for ChatRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChatRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRuntime").finish()
    }
}
