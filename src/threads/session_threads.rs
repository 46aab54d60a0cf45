//! Per-session bookkeeping of remote threads

use std::collections::HashMap;

use anyhow::Result;

use super::client::ThreadService;

/// Remote threads owned by one chat session.
///
/// Maps each remote agent ID to the thread the session uses with it. A thread
/// that answered a lookup is scheduled for deletion and replaced by a fresh
/// one once the turn ends.
#[derive(Debug, Clone, Default)]
pub struct SessionThreads {
    by_agent: HashMap<String, String>,
    pending_deletion: Vec<String>,
}

impl SessionThreads {
    /// Create one thread per remote agent
    pub async fn open(service: &dyn ThreadService, agent_ids: &[String]) -> Result<Self> {
        let mut by_agent = HashMap::new();
        for agent_id in agent_ids {
            let thread_id = service.create_thread().await?;
            tracing::info!(
                "[SessionThreads] Opened thread {} for remote agent {}",
                thread_id,
                agent_id
            );
            by_agent.insert(agent_id.clone(), thread_id);
        }
        Ok(Self {
            by_agent,
            pending_deletion: Vec::new(),
        })
    }

    /// Thread currently used with a remote agent
    pub fn thread_for(&self, agent_id: &str) -> Option<&str> {
        self.by_agent.get(agent_id).map(String::as_str)
    }

    /// Mark a thread for deletion at the end of the turn
    pub fn schedule_deletion(&mut self, thread_id: impl Into<String>) {
        let thread_id = thread_id.into();
        if !self.pending_deletion.contains(&thread_id) {
            self.pending_deletion.push(thread_id);
        }
    }

    /// Threads waiting for deletion
    pub fn pending_deletion(&self) -> &[String] {
        &self.pending_deletion
    }

    /// Number of tracked remote agents
    pub fn len(&self) -> usize {
        self.by_agent.len()
    }

    /// Whether no remote agent has a thread
    pub fn is_empty(&self) -> bool {
        self.by_agent.is_empty()
    }

    /// Delete every pending thread and give each affected agent a new one.
    ///
    /// Failures are logged and skipped. Agents whose replacement cannot be
    /// created lose their entry for the rest of the session.
    pub async fn recycle(&mut self, service: &dyn ThreadService) {
        if self.pending_deletion.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_deletion);

        for thread_id in &pending {
            if let Err(e) = service.delete_thread(thread_id).await {
                tracing::warn!("[SessionThreads] Failed to delete thread {}: {:#}", thread_id, e);
            }
        }

        let replaced: Vec<String> = self
            .by_agent
            .iter()
            .filter(|(_, thread)| pending.contains(thread))
            .map(|(agent, _)| agent.clone())
            .collect();

        for agent_id in replaced {
            match service.create_thread().await {
                Ok(thread_id) => {
                    tracing::info!(
                        "[SessionThreads] Replaced thread for remote agent {} with {}",
                        agent_id,
                        thread_id
                    );
                    self.by_agent.insert(agent_id, thread_id);
                }
                Err(e) => {
                    tracing::warn!(
                        "[SessionThreads] Failed to recreate thread for {}: {:#}",
                        agent_id,
                        e
                    );
                    self.by_agent.remove(&agent_id);
                }
            }
        }
    }

    /// Delete every thread this session holds
    pub async fn close(&mut self, service: &dyn ThreadService) {
        let mut all: Vec<String> = self.by_agent.drain().map(|(_, t)| t).collect();
        for thread_id in self.pending_deletion.drain(..) {
            if !all.contains(&thread_id) {
                all.push(thread_id);
            }
        }
        for thread_id in all {
            if let Err(e) = service.delete_thread(&thread_id).await {
                tracing::warn!("[SessionThreads] Failed to delete thread {}: {:#}", thread_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeThreadService;

    #[tokio::test]
    async fn test_open_creates_one_thread_per_agent() {
        let service = FakeThreadService::new();
        let threads = SessionThreads::open(&service, &["asst_faq".to_string()])
            .await
            .unwrap();

        assert_eq!(threads.len(), 1);
        assert_eq!(threads.thread_for("asst_faq"), Some("thread_1"));
        assert!(threads.thread_for("other").is_none());
    }

    #[tokio::test]
    async fn test_recycle_replaces_only_pending_threads() {
        let service = FakeThreadService::new();
        let mut threads =
            SessionThreads::open(&service, &["asst_faq".to_string(), "asst_other".to_string()])
                .await
                .unwrap();
        let faq_thread = threads.thread_for("asst_faq").unwrap().to_string();
        let other_thread = threads.thread_for("asst_other").unwrap().to_string();

        threads.schedule_deletion(faq_thread.clone());
        threads.schedule_deletion(faq_thread.clone());
        assert_eq!(threads.pending_deletion().len(), 1);

        threads.recycle(&service).await;

        assert!(threads.pending_deletion().is_empty());
        assert_eq!(service.deleted(), vec![faq_thread.clone()]);
        assert_ne!(threads.thread_for("asst_faq"), Some(faq_thread.as_str()));
        assert_eq!(threads.thread_for("asst_other"), Some(other_thread.as_str()));
    }

    #[tokio::test]
    async fn test_recycle_survives_delete_failure() {
        let service = FakeThreadService::new();
        let mut threads = SessionThreads::open(&service, &["asst_faq".to_string()])
            .await
            .unwrap();
        let old = threads.thread_for("asst_faq").unwrap().to_string();

        service.fail_deletes(true);
        threads.schedule_deletion(old.clone());
        threads.recycle(&service).await;

        assert!(service.deleted().is_empty());
        let new = threads.thread_for("asst_faq").unwrap();
        assert_ne!(new, old);
    }

    #[tokio::test]
    async fn test_recycle_drops_agent_when_recreate_fails() {
        let service = FakeThreadService::new();
        let mut threads = SessionThreads::open(&service, &["asst_faq".to_string()])
            .await
            .unwrap();
        let old = threads.thread_for("asst_faq").unwrap().to_string();

        service.fail_creates(true);
        threads.schedule_deletion(old.clone());
        threads.recycle(&service).await;

        assert_eq!(service.deleted(), vec![old]);
        assert!(threads.thread_for("asst_faq").is_none());
        assert!(threads.is_empty());
        assert!(threads.pending_deletion().is_empty());
    }

    #[tokio::test]
    async fn test_close_deletes_everything() {
        let service = FakeThreadService::new();
        let mut threads = SessionThreads::open(&service, &["asst_faq".to_string()])
            .await
            .unwrap();
        threads.close(&service).await;

        assert!(threads.is_empty());
        assert_eq!(service.deleted(), vec!["thread_1".to_string()]);
    }
}
