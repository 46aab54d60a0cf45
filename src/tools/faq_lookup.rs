//! FAQ lookup backed by a remote agent
//!
//! The question is posted to the session's thread for the remote FAQ agent,
//! a run is streamed (deltas are forwarded to the UI as tool progress) and
//! the agent's last text message becomes the tool output. A thread that
//! produced an answer is scheduled for deletion so the next lookup starts
//! from a fresh one; after a failed run the thread is kept and reused.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use super::tool::{required_str, Tool, ToolResult};
use crate::core::APOLOGY;
use crate::llm::{ToolDefinition, ToolInputSchema};
use crate::runtime::SessionInternals;
use crate::threads::{RunStreamEvent, ThreadService};

/// Name of the nested step the UI shows while the remote agent answers
pub const FAQ_STEP_NAME: &str = "faq-agent";

/// Answers questions through the hosted FAQ agent
pub struct FaqLookupTool {
    service: Arc<dyn ThreadService>,
    agent_id: String,
}

impl FaqLookupTool {
    pub fn new(service: Arc<dyn ThreadService>, agent_id: impl Into<String>) -> Self {
        Self {
            service,
            agent_id: agent_id.into(),
        }
    }

    /// Remote agent this tool talks to
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn lookup(&self, question: &str, internals: &mut SessionInternals) -> Result<String> {
        let thread_id = internals
            .session
            .threads
            .thread_for(&self.agent_id)
            .map(str::to_string)
            .with_context(|| format!("No thread open for remote agent {}", self.agent_id))?;
        tracing::debug!("[FaqLookup] Using thread {}", thread_id);

        self.service
            .create_message(&thread_id, question)
            .await
            .context("Failed to post question")?;

        let step_id = internals
            .current_tool_use_id
            .clone()
            .unwrap_or_else(|| FAQ_STEP_NAME.to_string());

        let mut stream = self
            .service
            .stream_run(&thread_id, &self.agent_id)
            .await
            .context("Failed to start run")?;

        let mut first_token = true;
        while let Some(event) = stream.next().await {
            match event? {
                RunStreamEvent::MessageDelta(text) => {
                    if first_token {
                        first_token = false;
                        tracing::info!(
                            "[FaqLookup] Elapsed time: {:.2} seconds - first token",
                            internals.turn_elapsed().as_secs_f64()
                        );
                    }
                    internals.send_tool_progress(&step_id, text);
                }
                RunStreamEvent::RunFailed(last_error) => {
                    bail!(
                        "Run failed: {}",
                        last_error.as_deref().unwrap_or("no error reported")
                    );
                }
                RunStreamEvent::Error(message) => bail!("Run stream error: {}", message),
                RunStreamEvent::Done => break,
                RunStreamEvent::Other(_) => {}
            }
        }

        let answer = self
            .service
            .last_agent_text(&thread_id)
            .await?
            .context("No response from the model.")?;
        internals.session.threads.schedule_deletion(&thread_id);
        Ok(answer)
    }
}

#[async_trait]
impl Tool for FaqLookupTool {
    fn name(&self) -> &str {
        "faq_lookup_tool"
    }

    fn description(&self) -> &str {
        "Lookup frequently asked questions."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name(),
            self.description(),
            ToolInputSchema::new()
                .with_properties(json!({
                    "question": {
                        "type": "string",
                        "description": "The customer's question."
                    }
                }))
                .with_required(vec!["question".to_string()]),
        )
    }

    async fn execute(
        &self,
        input: &Value,
        internals: &mut SessionInternals,
    ) -> Result<ToolResult> {
        let question = required_str(input, "question")?;
        tracing::info!(
            "[FaqLookup] User question: {} (elapsed {:.2} seconds)",
            question,
            internals.turn_elapsed().as_secs_f64()
        );

        match self.lookup(question, internals).await {
            Ok(answer) => Ok(ToolResult::success(answer)),
            Err(e) => {
                tracing::error!("[FaqLookup] Lookup failed: {:#}", e);
                Ok(ToolResult::success(APOLOGY))
            }
        }
    }
}
