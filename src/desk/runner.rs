//! Support Desk Runner
//!
//! The session loop that handles:
//! - Input → owning agent → tools / handoffs → output cycle
//! - Ownership changes between agents within and across turns
//! - Streaming responses (when enabled)
//! - Remote thread recycling after each message

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::StreamExt;
use serde_json::Value;

use crate::agents::{handoff_output, AgentGraph, AgentKind, HandoffData};
use crate::core::{DeskError, DeskResult, InputMessage, APOLOGY};
use crate::hooks::HookContext;
use crate::llm::{
    ContentBlock, ContentBlockStart, ContentDelta, LlmProvider, Message, StopReason, StreamEvent,
    ToolDefinition,
};
use crate::runtime::SessionInternals;
use crate::threads::ThreadService;

use super::config::DeskConfig;
use super::executor::ToolExecutor;

/// Content block being assembled from stream deltas
enum PartialBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input_json: String,
    },
}

impl PartialBlock {
    fn finish(self, internals: &SessionInternals) -> Option<ContentBlock> {
        match self {
            PartialBlock::Text(text) if text.is_empty() => None,
            PartialBlock::Text(text) => {
                internals.send_text_complete(&text);
                Some(ContentBlock::Text { text })
            }
            PartialBlock::ToolUse {
                id,
                name,
                input_json,
            } => {
                let input = if input_json.trim().is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str(&input_json).unwrap_or_else(|e| {
                        tracing::warn!("[SupportDesk] Malformed arguments for {}: {}", name, e);
                        Value::Object(Default::default())
                    })
                };
                Some(ContentBlock::ToolUse { id, name, input })
            }
        }
    }
}

/// The multi-agent support desk
///
/// # Example
///
/// ```ignore
/// let graph = AgentGraph::support_desk(&deployment, FaqLookupTool::new(service.clone(), faq_id));
/// let desk = Arc::new(SupportDesk::new(llm, graph, service.clone(), config));
///
/// let handle = runtime
///     .spawn(session, move |internals| async move { desk.run(internals).await })
///     .await;
/// ```
pub struct SupportDesk {
    config: DeskConfig,
    graph: AgentGraph,
    llm: Arc<dyn LlmProvider>,
    threads: Arc<dyn ThreadService>,
}

impl SupportDesk {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        graph: AgentGraph,
        threads: Arc<dyn ThreadService>,
        config: DeskConfig,
    ) -> Self {
        Self {
            config,
            graph,
            llm,
            threads,
        }
    }

    /// Run the session loop
    ///
    /// This is the main entry point - pass this to `runtime.spawn()`.
    pub async fn run(&self, mut internals: SessionInternals) -> DeskResult<()> {
        tracing::info!(
            "[SupportDesk] Session {} started, waiting for input...",
            internals.session_id()
        );

        loop {
            internals.set_idle().await;

            match internals.receive().await {
                Some(InputMessage::UserMessage { text, attachments }) => {
                    internals.start_turn();
                    internals.set_processing().await;
                    let input = InputMessage::compose_user_input(&text, &attachments);
                    tracing::info!("[SupportDesk] Received message: {}", input);

                    let mut current_input = input.clone();
                    let mut should_process = true;

                    if let Some(ref hooks) = self.config.hooks {
                        let mut ctx = HookContext::user_prompt_submit(&mut internals, &input);
                        let result = hooks.run(&mut ctx);

                        if let Some(modified) = ctx.user_prompt {
                            current_input = modified;
                        }

                        if result.is_denied() {
                            let reason =
                                result.reason.unwrap_or_else(|| "Blocked by hook".to_string());
                            tracing::info!("[SupportDesk] UserPromptSubmit hook denied: {}", reason);
                            internals.send_error(format!("Message blocked: {}", reason));
                            should_process = false;
                        }
                    }

                    if should_process {
                        self.handle_message(&mut internals, current_input).await;
                    }

                    internals.send_done();
                }

                Some(InputMessage::Shutdown) | None => {
                    tracing::info!(
                        "[SupportDesk] Session {} ending, closing threads",
                        internals.session_id()
                    );
                    internals.session.threads.close(self.threads.as_ref()).await;
                    internals.set_done().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one user message end to end.
    ///
    /// A failed turn keeps the user's message in the log but drops anything
    /// the agents produced, returns ownership to the agent that held it and
    /// shows the apology. Remote threads used during the turn are recycled
    /// either way.
    pub(crate) async fn handle_message(&self, internals: &mut SessionInternals, input: String) {
        internals.session.push_user_input(input);
        let snapshot = internals.session.snapshot();

        if let Err(e) = self.run_turn(internals).await {
            tracing::error!("[SupportDesk] Error: {:#}", e);
            internals.session.restore(snapshot);
            internals.send_error(APOLOGY);
        }

        internals
            .session
            .threads
            .recycle(self.threads.as_ref())
            .await;
    }

    /// Feed the item log to the owning agent until one answers without
    /// calling a tool or handing off.
    async fn run_turn(&self, internals: &mut SessionInternals) -> Result<()> {
        let mut model_calls = 0;
        let mut announced: Option<AgentKind> = None;

        loop {
            let owner = internals.session.current_agent;
            if announced != Some(owner) {
                internals.send_agent_updated(owner.name());
                announced = Some(owner);
            }

            model_calls += 1;
            if model_calls > self.config.max_turns {
                tracing::warn!(
                    "[SupportDesk] Max turns ({}) reached",
                    self.config.max_turns
                );
                return Err(DeskError::MaxTurnsExceeded(self.config.max_turns).into());
            }

            let persona = self.graph.persona(owner);
            let tool_definitions = persona.tool_definitions();
            let messages = internals.session.items.clone();

            tracing::info!(
                "[SupportDesk] {} calling model with {} items (call {})",
                owner,
                messages.len(),
                model_calls
            );

            let (content_blocks, stop_reason) = if self.config.streaming_enabled {
                self.call_llm_streaming(internals, &persona.model, messages, &persona.instructions, &tool_definitions)
                    .await?
            } else {
                self.call_llm_non_streaming(internals, &persona.model, messages, &persona.instructions, &tool_definitions)
                    .await?
            };

            tracing::info!("[SupportDesk] Model response: stop_reason={:?}", stop_reason);

            let tool_uses: Vec<(String, String, Value)> = content_blocks
                .iter()
                .filter_map(ContentBlock::as_tool_use)
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            internals
                .session
                .items
                .push(Message::assistant_with_blocks(content_blocks));

            if tool_uses.is_empty() {
                match stop_reason {
                    Some(StopReason::MaxTokens) => {
                        internals.send_status("Response truncated (max tokens)");
                    }
                    Some(StopReason::Refusal) => {
                        internals.send_status("Model refused to respond");
                    }
                    _ => {}
                }
                return Ok(());
            }

            let mut results: Vec<ContentBlock> = Vec::new();
            let mut next_owner: Option<AgentKind> = None;

            for (id, name, input) in tool_uses {
                tracing::info!("[SupportDesk] Tool use: {} ({})", name, id);

                let result = match self.graph.resolve_handoff(owner, &name) {
                    Some(Ok(target)) if next_owner.is_none() => {
                        match self.apply_handoff(internals, owner, target) {
                            Ok(()) => {
                                next_owner = Some(target);
                                ContentBlock::tool_result(&id, handoff_output(target).to_string(), false)
                            }
                            Err(reason) => ContentBlock::tool_result(&id, reason, true),
                        }
                    }
                    Some(Ok(target)) => {
                        tracing::warn!(
                            "[SupportDesk] Ignoring extra handoff to {} in the same response",
                            target
                        );
                        ContentBlock::tool_result(
                            &id,
                            "Multiple handoffs detected, ignoring this one.",
                            true,
                        )
                    }
                    Some(Err(e)) => {
                        tracing::warn!("[SupportDesk] {}", e);
                        ContentBlock::tool_result(&id, e.to_string(), true)
                    }
                    None => {
                        let hooks = self.config.hooks.as_deref();
                        let result =
                            ToolExecutor::execute(internals, &persona.tools, hooks, &name, &id, &input)
                                .await;
                        ContentBlock::tool_result(&id, &result.output, result.is_error)
                    }
                };
                results.push(result);
            }

            internals
                .session
                .items
                .push(Message::user_with_blocks(results));

            if let Some(target) = next_owner {
                internals.session.current_agent = target;
            }
        }
    }

    /// Run handoff hooks and announce the transfer.
    ///
    /// Returns the denial reason when a hook blocks it.
    fn apply_handoff(
        &self,
        internals: &mut SessionInternals,
        from: AgentKind,
        to: AgentKind,
    ) -> std::result::Result<(), String> {
        if let Some(ref hooks) = self.config.hooks {
            let data = HandoffData {
                from_agent: from,
                to_agent: to,
            };
            let mut ctx = HookContext::handoff(internals, data);
            let result = hooks.run(&mut ctx);
            if result.is_denied() {
                let reason = result
                    .reason
                    .unwrap_or_else(|| "Blocked by hook".to_string());
                tracing::info!("[SupportDesk] Handoff {} -> {} denied: {}", from, to, reason);
                return Err(format!("Handoff denied: {}", reason));
            }
        }

        tracing::info!("[SupportDesk] Handoff {} -> {}", from, to);
        internals.send_handoff(from.name(), to.name());
        Ok(())
    }

    /// Call the model without streaming
    async fn call_llm_non_streaming(
        &self,
        internals: &mut SessionInternals,
        model: &str,
        messages: Vec<Message>,
        instructions: &str,
        tool_definitions: &[ToolDefinition],
    ) -> Result<(Vec<ContentBlock>, Option<StopReason>)> {
        let response = self
            .llm
            .send_with_tools_and_system(
                model,
                messages,
                Some(instructions.to_string()),
                tool_definitions.to_vec(),
            )
            .await?;

        for block in &response.content {
            if let ContentBlock::Text { text } = block {
                internals.send_text(text);
                internals.send_text_complete(text);
            }
        }

        Ok((response.content, response.stop_reason))
    }

    /// Call the model with streaming - sends text deltas as they arrive
    async fn call_llm_streaming(
        &self,
        internals: &mut SessionInternals,
        model: &str,
        messages: Vec<Message>,
        instructions: &str,
        tool_definitions: &[ToolDefinition],
    ) -> Result<(Vec<ContentBlock>, Option<StopReason>)> {
        let mut stream = self
            .llm
            .stream_with_tools_and_system(
                model,
                messages,
                Some(instructions.to_string()),
                tool_definitions.to_vec(),
            )
            .await?;

        let mut open: BTreeMap<usize, PartialBlock> = BTreeMap::new();
        let mut finished: BTreeMap<usize, ContentBlock> = BTreeMap::new();
        let mut stop_reason: Option<StopReason> = None;

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::MessageStart { id } => {
                    tracing::debug!("[SupportDesk] Stream started: {}", id);
                }

                StreamEvent::ContentBlockStart(start) => {
                    let block = match start.content_block {
                        ContentBlockStart::Text => PartialBlock::Text(String::new()),
                        ContentBlockStart::ToolUse { id, name } => PartialBlock::ToolUse {
                            id,
                            name,
                            input_json: String::new(),
                        },
                    };
                    open.insert(start.index, block);
                }

                StreamEvent::ContentBlockDelta(delta) => {
                    // Some deployments skip the start event for text
                    let block = open
                        .entry(delta.index)
                        .or_insert_with(|| PartialBlock::Text(String::new()));
                    match (block, delta.delta) {
                        (PartialBlock::Text(accum), ContentDelta::TextDelta { text }) => {
                            internals.send_text(&text);
                            accum.push_str(&text);
                        }
                        (
                            PartialBlock::ToolUse { input_json, .. },
                            ContentDelta::InputJsonDelta { partial_json },
                        ) => {
                            input_json.push_str(&partial_json);
                        }
                        _ => {
                            tracing::warn!(
                                "[SupportDesk] Delta does not match block {}",
                                delta.index
                            );
                        }
                    }
                }

                StreamEvent::ContentBlockStop(stop) => {
                    if let Some(block) = open.remove(&stop.index) {
                        if let Some(block) = block.finish(internals) {
                            finished.insert(stop.index, block);
                        }
                    }
                }

                StreamEvent::MessageDelta {
                    stop_reason: reason,
                    usage,
                } => {
                    stop_reason = reason;
                    if let Some(usage) = usage {
                        tracing::debug!(
                            "[SupportDesk] Usage: {} in / {} out",
                            usage.input_tokens,
                            usage.output_tokens
                        );
                    }
                }

                StreamEvent::MessageStop => {
                    tracing::debug!("[SupportDesk] Stream complete");
                }

                StreamEvent::Error(err) => {
                    return Err(anyhow!(
                        "Stream error ({}): {}",
                        err.code.as_deref().unwrap_or("unknown"),
                        err.message
                    ));
                }
            }
        }

        for (index, block) in std::mem::take(&mut open) {
            if let Some(block) = block.finish(internals) {
                finished.insert(index, block);
            }
        }

        Ok((finished.into_values().collect(), stop_reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InputMessage, OutputChunk};
    use crate::hooks::{support_desk_hooks, HookEvent, HookRegistry, HookResult};
    use crate::runtime::{ChatRuntime, OutputReceiver};
    use crate::session::ChatSession;
    use crate::testing::{test_internals_with_threads, FakeThreadService, ScriptedProvider};
    use crate::threads::RunStreamEvent;
    use crate::tools::FaqLookupTool;
    use serde_json::json;

    const FAQ_AGENT_ID: &str = "asst_faq";

    fn desk(
        llm: Arc<ScriptedProvider>,
        service: Arc<FakeThreadService>,
        config: DeskConfig,
    ) -> SupportDesk {
        let faq = FaqLookupTool::new(service.clone(), FAQ_AGENT_ID);
        let graph = AgentGraph::support_desk("gpt-4o", faq);
        SupportDesk::new(llm, graph, service, config)
    }

    fn default_config() -> DeskConfig {
        DeskConfig::new().with_hooks(support_desk_hooks().unwrap())
    }

    fn drain(rx: &mut OutputReceiver) -> Vec<OutputChunk> {
        let mut chunks = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            chunks.push(chunk);
        }
        chunks
    }

    fn streamed_text(chunks: &[OutputChunk]) -> String {
        chunks
            .iter()
            .filter_map(|c| match c {
                OutputChunk::TextDelta(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn agent_updates(chunks: &[OutputChunk]) -> Vec<String> {
        chunks
            .iter()
            .filter_map(|c| match c {
                OutputChunk::AgentUpdated(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_triage_answers_greeting() {
        let llm = Arc::new(ScriptedProvider::new().reply_text("Hello! How can I help?"));
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "hi".into()).await;

        let chunks = drain(&mut rx);
        assert_eq!(agent_updates(&chunks), vec!["Triage Agent"]);
        assert_eq!(streamed_text(&chunks), "Hello! How can I help?");
        assert_eq!(internals.session.current_agent, AgentKind::Triage);
        assert_eq!(internals.session.items.len(), 2);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gpt-4o");
        assert!(calls[0].system.contains("triaging agent"));
        assert_eq!(
            calls[0].tool_names,
            vec![
                "transfer_to_account_management_agent",
                "transfer_to_faq_agent",
                "transfer_to_live_agent"
            ]
        );
    }

    #[tokio::test]
    async fn test_handoff_to_account_management_stamps_user_id() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_account_management_agent", json!({}))
                .reply_text("Please share your new user name, ID image and birth date."),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "I want to change my user name".into())
            .await;

        let chunks = drain(&mut rx);
        assert_eq!(
            agent_updates(&chunks),
            vec!["Triage Agent", "Account Management Agent"]
        );
        assert!(chunks.iter().any(|c| matches!(
            c,
            OutputChunk::Handoff { from, to } if from == "Triage Agent" && to == "Account Management Agent"
        )));
        assert_eq!(internals.session.current_agent, AgentKind::AccountManagement);

        let user_id = internals.context().user_id.clone().unwrap();
        let n: u32 = user_id.strip_prefix("ID-").unwrap().parse().unwrap();
        assert!((100..=999).contains(&n));

        // user, assistant(tool call), tool result, assistant(text)
        let items = &internals.session.items;
        assert_eq!(items.len(), 4);
        let result = items[2].blocks().unwrap();
        assert!(matches!(
            &result[0],
            ContentBlock::ToolResult { content: Some(c), is_error: None, .. }
                if c == r#"{"assistant":"Account Management Agent"}"#
        ));

        let calls = llm.calls();
        assert!(calls[1].system.contains("account management agent"));
        assert_eq!(calls[1].item_count, 3);
    }

    #[tokio::test]
    async fn test_ownership_persists_across_messages() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_account_management_agent", json!({}))
                .reply_text("What is your new user name?")
                .reply_tool(
                    "call_2",
                    "update_user_name",
                    json!({"user_name": "jdoe", "image_path": "/tmp/id.png", "birth_date": "1990-01-01"}),
                )
                .reply_text("Done, your user name is updated."),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "change my name".into()).await;
        desk.handle_message(&mut internals, "jdoe, 1990-01-01".into()).await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[2].system.contains("account management agent"));
        assert_eq!(internals.session.current_agent, AgentKind::AccountManagement);
        assert_eq!(internals.context().user_name.as_deref(), Some("jdoe"));
        assert_eq!(internals.context().birth_date.as_deref(), Some("1990-01-01"));
    }

    #[tokio::test]
    async fn test_faq_flow_recycles_thread() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_faq_agent", json!({}))
                .reply_tool("call_2", "faq_lookup_tool", json!({"question": "What is in the review?"}))
                .reply_text("The review covers FY24 operations."),
        );
        let service = Arc::new(
            FakeThreadService::new()
                .with_run_events(vec![
                    RunStreamEvent::MessageDelta("FY24 ".into()),
                    RunStreamEvent::MessageDelta("operations".into()),
                    RunStreamEvent::Done,
                ])
                .with_last_text("FY24 operations"),
        );
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;
        let first_thread = internals
            .session
            .threads
            .thread_for(FAQ_AGENT_ID)
            .unwrap()
            .to_string();

        desk.handle_message(&mut internals, "What is in the review?".into())
            .await;

        let chunks = drain(&mut rx);
        let progress: Vec<_> = chunks
            .iter()
            .filter_map(|c| match c {
                OutputChunk::ToolProgress { id, output } if id == "call_2" => Some(output.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec!["FY24 ", "operations"]);
        assert_eq!(streamed_text(&chunks), "The review covers FY24 operations.");
        assert_eq!(internals.session.current_agent, AgentKind::Faq);

        assert_eq!(service.deleted(), vec![first_thread.clone()]);
        let replacement = internals.session.threads.thread_for(FAQ_AGENT_ID).unwrap();
        assert_ne!(replacement, first_thread);
        assert!(internals.session.threads.pending_deletion().is_empty());

        let tool_result = internals.session.items[4].blocks().unwrap();
        assert!(matches!(
            &tool_result[0],
            ContentBlock::ToolResult { content: Some(c), .. } if c == "FY24 operations"
        ));
    }

    #[tokio::test]
    async fn test_failed_faq_run_keeps_thread() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_faq_agent", json!({}))
                .reply_tool("call_2", "faq_lookup_tool", json!({"question": "What is in the review?"}))
                .reply_text("Sorry, I could not find that."),
        );
        let service = Arc::new(
            FakeThreadService::new()
                .with_run_events(vec![RunStreamEvent::RunFailed(Some("boom".into()))]),
        );
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;
        let thread = internals
            .session
            .threads
            .thread_for(FAQ_AGENT_ID)
            .unwrap()
            .to_string();

        desk.handle_message(&mut internals, "What is in the review?".into())
            .await;

        assert!(service.deleted().is_empty());
        assert_eq!(service.created(), vec![thread.clone()]);
        assert_eq!(
            internals.session.threads.thread_for(FAQ_AGENT_ID),
            Some(thread.as_str())
        );
        let tool_result = internals.session.items[4].blocks().unwrap();
        assert!(matches!(
            &tool_result[0],
            ContentBlock::ToolResult { content: Some(c), .. } if c == APOLOGY
        ));
    }

    #[tokio::test]
    async fn test_stream_error_mid_reply_rolls_back() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_account_management_agent", json!({}))
                .reply_stream_error("Let me ", "server_error"),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "change my name".into()).await;

        let chunks = drain(&mut rx);
        assert_eq!(streamed_text(&chunks), "Let me ");
        assert!(!chunks
            .iter()
            .any(|c| matches!(c, OutputChunk::TextComplete(_))));
        assert!(matches!(
            chunks.iter().rev().find(|c| matches!(c, OutputChunk::Error(_))),
            Some(OutputChunk::Error(msg)) if msg == APOLOGY
        ));
        assert_eq!(internals.session.items.len(), 1);
        assert_eq!(internals.session.current_agent, AgentKind::Triage);
        assert!(internals.context().has_user_id());
    }

    #[tokio::test]
    async fn test_provider_failure_shows_apology_and_rolls_back() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_account_management_agent", json!({}))
                .reply_error("503 Service Unavailable"),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "change my name".into()).await;

        let chunks = drain(&mut rx);
        assert!(chunks
            .iter()
            .any(|c| matches!(c, OutputChunk::Error(msg) if msg == APOLOGY)));
        assert_eq!(internals.session.current_agent, AgentKind::Triage);
        assert_eq!(internals.session.items.len(), 1);
        assert!(internals.context().has_user_id());
    }

    #[tokio::test]
    async fn test_invalid_edge_is_rejected() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_live_agent", json!({}))
                .reply_text("Let me look that up."),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;
        internals.session.current_agent = AgentKind::Faq;

        desk.handle_message(&mut internals, "get me a human".into()).await;

        assert_eq!(internals.session.current_agent, AgentKind::Faq);
        let result = internals.session.items[2].blocks().unwrap();
        assert!(matches!(
            &result[0],
            ContentBlock::ToolResult { content: Some(c), is_error: Some(true), .. }
                if c.contains("Handoff rejected")
        ));
    }

    #[tokio::test]
    async fn test_live_handoff_and_back_edge() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_live_agent", json!({}))
                .reply_text("Hi, this is Sarah. Let me note that down for you.")
                .reply_tool("call_2", "transfer_to_triage_agent", json!({}))
                .reply_text("Anything else?"),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "I want a human".into()).await;
        assert_eq!(internals.session.current_agent, AgentKind::Live);
        assert!(internals.context().user_id.is_none());

        desk.handle_message(&mut internals, "thanks, all sorted".into()).await;
        assert_eq!(internals.session.current_agent, AgentKind::Triage);
    }

    #[tokio::test]
    async fn test_only_first_handoff_is_honoured() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tools(vec![
                    ("call_1", "transfer_to_faq_agent", json!({})),
                    ("call_2", "transfer_to_live_agent", json!({})),
                ])
                .reply_text("FAQ here."),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config());
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "question".into()).await;

        assert_eq!(internals.session.current_agent, AgentKind::Faq);
        let results = internals.session.items[2].blocks().unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[1],
            ContentBlock::ToolResult { is_error: Some(true), .. }
        ));
    }

    #[tokio::test]
    async fn test_max_turns_exceeded() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("c1", "transfer_to_faq_agent", json!({}))
                .reply_tool("c2", "transfer_to_triage_agent", json!({}))
                .reply_tool("c3", "transfer_to_faq_agent", json!({})),
        );
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config().with_max_turns(2));
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "loop".into()).await;

        assert_eq!(llm.calls().len(), 2);
        assert!(drain(&mut rx)
            .iter()
            .any(|c| matches!(c, OutputChunk::Error(msg) if msg == APOLOGY)));
        assert_eq!(internals.session.current_agent, AgentKind::Triage);
    }

    #[tokio::test]
    async fn test_handoff_hook_can_deny() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .reply_tool("call_1", "transfer_to_live_agent", json!({}))
                .reply_text("Our team is offline."),
        );
        let service = Arc::new(FakeThreadService::new());
        let mut hooks = HookRegistry::new();
        hooks
            .add_with_pattern(HookEvent::Handoff, "^Live Agent$", |_ctx: &mut HookContext| {
                HookResult::deny("after hours")
            })
            .unwrap();
        let desk = desk(llm.clone(), service.clone(), DeskConfig::new().with_hooks(hooks));
        let (mut internals, _tx, _rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "human please".into()).await;

        assert_eq!(internals.session.current_agent, AgentKind::Triage);
    }

    #[tokio::test]
    async fn test_non_streaming_mode() {
        let llm = Arc::new(ScriptedProvider::new().reply_text("Hello!"));
        let service = Arc::new(FakeThreadService::new());
        let desk = desk(llm.clone(), service.clone(), default_config().with_streaming(false));
        let (mut internals, _tx, mut rx) =
            test_internals_with_threads(service.as_ref(), FAQ_AGENT_ID).await;

        desk.handle_message(&mut internals, "hi".into()).await;

        let chunks = drain(&mut rx);
        assert_eq!(streamed_text(&chunks), "Hello!");
        assert!(chunks
            .iter()
            .any(|c| matches!(c, OutputChunk::TextComplete(t) if t == "Hello!")));
    }

    #[tokio::test]
    async fn test_session_loop_over_runtime() {
        let llm = Arc::new(ScriptedProvider::new().reply_text("Hello!"));
        let service = Arc::new(FakeThreadService::new());
        let desk = Arc::new(desk(llm.clone(), service.clone(), default_config()));

        let session = ChatSession::start(service.as_ref(), &[FAQ_AGENT_ID.to_string()])
            .await
            .unwrap();
        let runtime = ChatRuntime::new();
        let handle = runtime
            .spawn(session, move |internals| async move { desk.run(internals).await })
            .await;
        let mut rx = handle.subscribe();

        handle
            .send(InputMessage::UserMessage {
                text: "my passport".into(),
                attachments: vec![
                    crate::core::Attachment::from_path("/uploads/passport.png"),
                    crate::core::Attachment::from_path("/uploads/notes.txt"),
                ],
            })
            .await
            .unwrap();

        loop {
            if matches!(rx.recv().await.unwrap(), OutputChunk::Done) {
                break;
            }
        }

        let calls = llm.calls();
        assert_eq!(
            calls[0].last_user_text,
            "my passport\n[uploaded image] /uploads/passport.png"
        );

        handle.shutdown().await.unwrap();
        handle.wait_for_completion().await;
        assert!(handle.is_done().await);
        assert_eq!(service.deleted(), vec!["thread_1".to_string()]);
    }
}
