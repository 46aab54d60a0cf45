//! Azure OpenAI chat-completions client
//!
//! Translates between the internal message types and the chat-completions
//! wire format used by Azure OpenAI deployments.
//!
//! ```ignore
//! let llm = AzureOpenAiProvider::new(endpoint, api_key, "2024-10-21")
//!     .with_deployment("gpt-4o");
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::auth::{auth_provider, AuthConfig, AuthSource};
use super::provider::{EventStream, LlmProvider};
use super::types::{
    ContentBlock, ContentBlockDeltaEvent, ContentBlockStart, ContentBlockStartEvent,
    ContentBlockStopEvent, ContentDelta, Message, MessageContent, MessageResponse, StopReason,
    StreamError, StreamEvent, ToolDefinition, Usage,
};

// ============================================================================
// Chat-completions wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<ChatUsage> for Usage {
    fn from(u: ChatUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    id: String,
    #[serde(default)]
    choices: Vec<ChatChunkChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChunkChoice {
    #[serde(default)]
    delta: ChatChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChatFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: StreamError,
}

// ============================================================================
// Provider
// ============================================================================

/// Client for an Azure OpenAI resource
pub struct AzureOpenAiProvider {
    client: Client,
    auth: AuthSource,
    endpoint: String,
    api_version: String,
    deployment: String,
}

impl AzureOpenAiProvider {
    /// Create a provider for `endpoint` (e.g. `https://myresource.openai.azure.com`)
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            auth: AuthSource::Static(AuthConfig::new(api_key)),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
            deployment: String::new(),
        }
    }

    /// Create a provider whose key is fetched before each request.
    ///
    /// `AuthConfig.base_url`, if set, replaces the endpoint.
    pub fn with_auth_provider<F, Fut>(
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
        provider: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
    {
        Self {
            client: Client::new(),
            auth: AuthSource::Dynamic(Arc::new(auth_provider(provider))),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
            deployment: String::new(),
        }
    }

    /// Set the default deployment
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    fn completions_url(&self, base: &str, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            base.trim_end_matches('/'),
            deployment,
            self.api_version
        )
    }

    // ========================================================================
    // Format conversion: Internal -> chat-completions
    // ========================================================================

    fn convert_messages(messages: &[Message], system: Option<&str>) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system {
            out.push(ChatMessage::text("system", system));
        }

        for message in messages {
            match &message.content {
                MessageContent::Text(text) => out.push(ChatMessage::text(&message.role, text)),
                MessageContent::Blocks(blocks) => {
                    if message.role == "assistant" {
                        out.push(Self::convert_assistant_blocks(blocks));
                    } else {
                        out.extend(Self::convert_user_blocks(&message.role, blocks));
                    }
                }
            }
        }
        out
    }

    fn convert_assistant_blocks(blocks: &[ContentBlock]) -> ChatMessage {
        let mut text = String::new();
        let mut calls = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text: t } => text.push_str(t),
                ContentBlock::ToolUse { id, name, input } => calls.push(ChatToolCall {
                    id: id.clone(),
                    call_type: function_type(),
                    function: ChatFunctionCall {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                }),
                ContentBlock::ToolResult { .. } => {}
            }
        }

        ChatMessage {
            role: "assistant".to_string(),
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: if calls.is_empty() { None } else { Some(calls) },
            tool_call_id: None,
        }
    }

    /// Tool results become `tool` messages; any text follows as one message
    fn convert_user_blocks(role: &str, blocks: &[ContentBlock]) -> Vec<ChatMessage> {
        let mut out = Vec::new();
        let mut text = String::new();
        for block in blocks {
            match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => out.push(ChatMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone().unwrap_or_default()),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                }),
                ContentBlock::Text { text: t } => text.push_str(t),
                ContentBlock::ToolUse { .. } => {}
            }
        }
        if !text.is_empty() {
            out.push(ChatMessage::text(role, text));
        }
        out
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
        tools
            .iter()
            .map(|t| ChatTool {
                tool_type: "function",
                function: ChatFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: serde_json::to_value(&t.input_schema)
                        .unwrap_or_else(|_| Value::Object(Default::default())),
                },
            })
            .collect()
    }

    fn build_request(
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
        stream: bool,
    ) -> ChatRequest {
        ChatRequest {
            messages: Self::convert_messages(messages, system),
            tools: Self::convert_tools(tools),
            stream,
        }
    }

    // ========================================================================
    // Format conversion: chat-completions -> Internal
    // ========================================================================

    fn convert_response(resp: ChatResponse) -> Result<MessageResponse> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .context("Chat completion returned no choices")?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::text(text));
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            content.push(ContentBlock::tool_use(
                call.id,
                call.function.name,
                parse_arguments(&call.function.arguments),
            ));
        }

        Ok(MessageResponse {
            id: resp.id,
            content,
            model: resp.model,
            stop_reason: choice.finish_reason.as_deref().map(parse_finish_reason),
            usage: resp.usage.map(Usage::from).unwrap_or_default(),
        })
    }

    // ========================================================================
    // API methods
    // ========================================================================

    async fn post(&self, model: &str, request: &ChatRequest) -> Result<reqwest::Response> {
        let auth_config = self
            .auth
            .get_auth()
            .await
            .context("Failed to get authentication credentials")?;
        let base = auth_config.base_url.as_deref().unwrap_or(&self.endpoint);
        let url = self.completions_url(base, model);

        let request_json =
            serde_json::to_string(request).context("Failed to serialize chat request")?;
        tracing::debug!("[AzureOpenAI] Request JSON: {}", request_json);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("api-key", &auth_config.api_key)
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to Azure OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!("[AzureOpenAI] API error: {} - {}", status, error_text);
            anyhow::bail!("Azure OpenAI API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

fn parse_finish_reason(reason: &str) -> StopReason {
    match reason {
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::Refusal,
        _ => StopReason::EndTurn,
    }
}

/// Arguments arrive as a JSON string; malformed JSON becomes an empty object
fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(arguments).unwrap_or_else(|e| {
        tracing::warn!("[AzureOpenAI] Unparseable tool arguments: {}", e);
        Value::Object(Default::default())
    })
}

// ============================================================================
// LlmProvider implementation
// ============================================================================

#[async_trait::async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn send_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse> {
        let request = Self::build_request(&messages, system.as_deref(), &tools, false);
        let response = self.post(model, &request).await?;

        let response_text = response
            .text()
            .await
            .context("Failed to read Azure OpenAI response body")?;
        tracing::debug!("[AzureOpenAI] Response body: {}", response_text);

        let chat: ChatResponse = serde_json::from_str(&response_text)
            .context("Failed to parse Azure OpenAI response")?;
        Self::convert_response(chat)
    }

    async fn stream_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<EventStream> {
        let request = Self::build_request(&messages, system.as_deref(), &tools, true);
        let response = self.post(model, &request).await?;

        tracing::info!("[AzureOpenAI] Streaming response started");

        let byte_stream = response.bytes_stream();
        let stream_reader = StreamReader::new(
            byte_stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        );
        let buf_reader = tokio::io::BufReader::new(stream_reader);

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();
            let mut started = false;
            let mut next_index: usize = 0;
            let mut text_index: Option<usize> = None;
            // wire tool-call index -> internal block index
            let mut tool_indices: HashMap<usize, usize> = HashMap::new();
            let mut finished = false;
            let mut failed = false;

            while let Some(line) = lines.next_line().await? {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == "[DONE]" {
                    break;
                }

                // Every chunk field is optional, so an error payload would
                // also parse as an empty chunk
                if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
                    tracing::warn!(
                        "[AzureOpenAI] Stream error: {}",
                        envelope.error.message
                    );
                    yield StreamEvent::Error(envelope.error);
                    failed = true;
                    break;
                }

                let chunk: ChatChunk = match serde_json::from_str(data) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("[AzureOpenAI] Failed to parse streaming chunk: {}", e);
                        continue;
                    }
                };

                if !started {
                    started = true;
                    yield StreamEvent::MessageStart { id: chunk.id.clone() };
                }

                let usage = chunk.usage.map(Usage::from);

                for choice in chunk.choices {
                    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                        let index = match text_index {
                            Some(i) => i,
                            None => {
                                let i = next_index;
                                next_index += 1;
                                text_index = Some(i);
                                yield StreamEvent::ContentBlockStart(ContentBlockStartEvent {
                                    index: i,
                                    content_block: ContentBlockStart::Text,
                                });
                                i
                            }
                        };
                        yield StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent {
                            index,
                            delta: ContentDelta::TextDelta { text },
                        });
                    }

                    for call in choice.delta.tool_calls.unwrap_or_default() {
                        let index = match tool_indices.get(&call.index) {
                            Some(i) => *i,
                            None => {
                                if let Some(i) = text_index.take() {
                                    yield StreamEvent::ContentBlockStop(ContentBlockStopEvent { index: i });
                                }
                                let i = next_index;
                                next_index += 1;
                                tool_indices.insert(call.index, i);
                                let name = call
                                    .function
                                    .as_ref()
                                    .and_then(|f| f.name.clone())
                                    .unwrap_or_default();
                                yield StreamEvent::ContentBlockStart(ContentBlockStartEvent {
                                    index: i,
                                    content_block: ContentBlockStart::ToolUse {
                                        id: call.id.clone().unwrap_or_default(),
                                        name,
                                    },
                                });
                                i
                            }
                        };
                        if let Some(arguments) = call
                            .function
                            .and_then(|f| f.arguments)
                            .filter(|a| !a.is_empty())
                        {
                            yield StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent {
                                index,
                                delta: ContentDelta::InputJsonDelta { partial_json: arguments },
                            });
                        }
                    }

                    if let Some(reason) = choice.finish_reason {
                        tracing::info!("[AzureOpenAI] Stream: finish_reason={}", reason);
                        if let Some(i) = text_index.take() {
                            yield StreamEvent::ContentBlockStop(ContentBlockStopEvent { index: i });
                        }
                        let mut open: Vec<usize> = tool_indices.drain().map(|(_, i)| i).collect();
                        open.sort_unstable();
                        for i in open {
                            yield StreamEvent::ContentBlockStop(ContentBlockStopEvent { index: i });
                        }
                        yield StreamEvent::MessageDelta {
                            stop_reason: Some(parse_finish_reason(&reason)),
                            usage: usage.clone(),
                        };
                        finished = true;
                    }
                }
            }

            if !failed {
                if let Some(i) = text_index.take() {
                    yield StreamEvent::ContentBlockStop(ContentBlockStopEvent { index: i });
                }
                let mut open: Vec<usize> = tool_indices.drain().map(|(_, i)| i).collect();
                open.sort_unstable();
                for i in open {
                    yield StreamEvent::ContentBlockStop(ContentBlockStopEvent { index: i });
                }

                tracing::debug!("[AzureOpenAI] Stream ended, finished={}", finished);
                yield StreamEvent::MessageStop;
            }
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> String {
        self.deployment.clone()
    }

    fn provider_name(&self) -> &str {
        "azure-openai"
    }
}
