//! Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::core::SessionState;
use crate::llm::{
    ContentBlock, ContentBlockDeltaEvent, ContentBlockStart, ContentBlockStartEvent,
    ContentBlockStopEvent, ContentDelta, EventStream, LlmProvider, Message, MessageResponse,
    StopReason, StreamError, StreamEvent, ToolDefinition, Usage,
};
use crate::runtime::{create_session_channels, InputSender, OutputReceiver, SessionInternals};
use crate::session::ChatSession;
use crate::threads::{RunEventStream, RunStreamEvent, SessionThreads, ThreadService};
use crate::tools::{Tool, ToolResult};

// ============================================================================
// Session internals
// ============================================================================

/// Internals for a session with no remote threads
pub fn test_internals() -> (SessionInternals, InputSender, OutputReceiver) {
    internals_for(ChatSession::with_id("test-session", SessionThreads::default()))
}

/// Internals for a session with one open thread for `agent_id`
pub async fn test_internals_with_threads(
    service: &dyn ThreadService,
    agent_id: &str,
) -> (SessionInternals, InputSender, OutputReceiver) {
    let threads = SessionThreads::open(service, &[agent_id.to_string()])
        .await
        .unwrap();
    internals_for(ChatSession::with_id("test-session", threads))
}

fn internals_for(session: ChatSession) -> (SessionInternals, InputSender, OutputReceiver) {
    let (input_tx, input_rx, output_tx) = create_session_channels();
    let output_rx = output_tx.subscribe();
    let state = Arc::new(RwLock::new(SessionState::Idle));
    let internals = SessionInternals::new(session, input_rx, output_tx, state);
    (internals, input_tx, output_rx)
}

// ============================================================================
// Thread service
// ============================================================================

#[derive(Default)]
struct FakeThreadState {
    next_thread: usize,
    created: Vec<String>,
    deleted: Vec<String>,
    messages: Vec<(String, String)>,
    runs: Vec<(String, String)>,
    fail_creates: bool,
    fail_deletes: bool,
}

/// In-memory `ThreadService` that records every call
pub struct FakeThreadService {
    state: Mutex<FakeThreadState>,
    run_events: Vec<RunStreamEvent>,
    last_text: Option<String>,
}

impl FakeThreadService {
    /// Threads are named `thread_1`, `thread_2`, ... in creation order
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeThreadState::default()),
            run_events: vec![RunStreamEvent::Done],
            last_text: None,
        }
    }

    /// Events every streamed run yields
    pub fn with_run_events(mut self, events: Vec<RunStreamEvent>) -> Self {
        self.run_events = events;
        self
    }

    /// Text `last_agent_text` reports after a run
    pub fn with_last_text(mut self, text: impl Into<String>) -> Self {
        self.last_text = Some(text.into());
        self
    }

    pub fn fail_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_creates = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().unwrap().fail_deletes = fail;
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// `(thread, content)` for every posted message
    pub fn messages(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().messages.clone()
    }

    /// `(thread, agent)` for every started run
    pub fn runs(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().runs.clone()
    }
}

#[async_trait]
impl ThreadService for FakeThreadService {
    async fn create_thread(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_creates {
            bail!("create_thread failed: 500 Internal Server Error");
        }
        state.next_thread += 1;
        let id = format!("thread_{}", state.next_thread);
        state.created.push(id.clone());
        Ok(id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            bail!("delete_thread failed: 404 Not Found");
        }
        state.deleted.push(thread_id.to_string());
        Ok(())
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .messages
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn stream_run(&self, thread_id: &str, agent_id: &str) -> Result<RunEventStream> {
        self.state
            .lock()
            .unwrap()
            .runs
            .push((thread_id.to_string(), agent_id.to_string()));
        let events: Vec<Result<RunStreamEvent>> = self.run_events.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn last_agent_text(&self, _thread_id: &str) -> Result<Option<String>> {
        Ok(self.last_text.clone())
    }
}

// ============================================================================
// Model provider
// ============================================================================

enum Reply {
    Blocks(Vec<ContentBlock>),
    Error(String),
    /// Streams `text`, then a stream error event with `code`
    StreamError { text: String, code: String },
}

/// What the desk sent on one model call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub tool_names: Vec<String>,
    pub item_count: usize,
    /// Text of the most recent plain text item
    pub last_user_text: String,
}

/// Provider that plays back a queue of replies
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_text(self, text: &str) -> Self {
        self.push(Reply::Blocks(vec![ContentBlock::text(text)]))
    }

    pub fn reply_tool(self, id: &str, name: &str, input: Value) -> Self {
        self.push(Reply::Blocks(vec![ContentBlock::tool_use(id, name, input)]))
    }

    pub fn reply_tools(self, calls: Vec<(&str, &str, Value)>) -> Self {
        let blocks = calls
            .into_iter()
            .map(|(id, name, input)| ContentBlock::tool_use(id, name, input))
            .collect();
        self.push(Reply::Blocks(blocks))
    }

    pub fn reply_error(self, message: &str) -> Self {
        self.push(Reply::Error(message.to_string()))
    }

    pub fn reply_stream_error(self, text: &str, code: &str) -> Self {
        self.push(Reply::StreamError {
            text: text.to_string(),
            code: code.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn next_reply(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<String>,
        tools: &[ToolDefinition],
    ) -> Result<Reply> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            system: system.unwrap_or_default(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            item_count: messages.len(),
            last_user_text: messages
                .iter()
                .rev()
                .find_map(|m| m.text())
                .unwrap_or_default()
                .to_string(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Error(message)) => Err(anyhow!(message)),
            Some(reply) => Ok(reply),
            None => bail!("no scripted reply left"),
        }
    }

    fn stop_reason(blocks: &[ContentBlock]) -> StopReason {
        if blocks.iter().any(|b| b.as_tool_use().is_some()) {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse> {
        let content = match self.next_reply(model, &messages, system, &tools)? {
            Reply::Blocks(blocks) => blocks,
            Reply::StreamError { code, .. } => bail!("stream error: {}", code),
            Reply::Error(message) => bail!(message),
        };
        Ok(MessageResponse {
            id: "resp_1".to_string(),
            stop_reason: Some(Self::stop_reason(&content)),
            content,
            model: model.to_string(),
            usage: Usage::default(),
        })
    }

    async fn stream_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<EventStream> {
        let mut events = vec![StreamEvent::MessageStart {
            id: "resp_1".to_string(),
        }];

        let blocks = match self.next_reply(model, &messages, system, &tools)? {
            Reply::Blocks(blocks) => blocks,
            Reply::StreamError { text, code } => {
                events.push(StreamEvent::ContentBlockStart(ContentBlockStartEvent {
                    index: 0,
                    content_block: ContentBlockStart::Text,
                }));
                events.push(StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent {
                    index: 0,
                    delta: ContentDelta::TextDelta { text },
                }));
                events.push(StreamEvent::Error(StreamError {
                    code: Some(code),
                    message: "The server had an error while processing your request.".to_string(),
                }));
                return Ok(Box::pin(futures::stream::iter(
                    events.into_iter().map(Ok::<_, anyhow::Error>),
                )));
            }
            Reply::Error(message) => bail!(message),
        };
        for (index, block) in blocks.iter().enumerate() {
            let (start, delta) = match block {
                ContentBlock::Text { text } => (
                    ContentBlockStart::Text,
                    ContentDelta::TextDelta { text: text.clone() },
                ),
                ContentBlock::ToolUse { id, name, input } => (
                    ContentBlockStart::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                    },
                    ContentDelta::InputJsonDelta {
                        partial_json: input.to_string(),
                    },
                ),
                ContentBlock::ToolResult { .. } => continue,
            };
            events.push(StreamEvent::ContentBlockStart(ContentBlockStartEvent {
                index,
                content_block: start,
            }));
            events.push(StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent { index, delta }));
            events.push(StreamEvent::ContentBlockStop(ContentBlockStopEvent { index }));
        }
        events.push(StreamEvent::MessageDelta {
            stop_reason: Some(Self::stop_reason(&blocks)),
            usage: None,
        });
        events.push(StreamEvent::MessageStop);

        Ok(Box::pin(futures::stream::iter(
            events.into_iter().map(Ok::<_, anyhow::Error>),
        )))
    }

    fn model(&self) -> String {
        "gpt-4o".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Tools
// ============================================================================

/// Tool that always succeeds with a fixed output
pub struct StubTool {
    name: String,
    output: String,
}

impl StubTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            output: output.to_string(),
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Stub tool for tests"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name.clone(),
            "Stub tool for tests",
            crate::llm::ToolInputSchema::new().with_properties(json!({})),
        )
    }

    async fn execute(
        &self,
        _input: &Value,
        _internals: &mut SessionInternals,
    ) -> Result<ToolResult> {
        Ok(ToolResult::success(self.output.clone()))
    }
}
