//! LLM Provider trait
//!
//! Abstracts the model interface so the desk runner can be driven by the
//! hosted deployment in production and by scripted providers in tests.

use anyhow::Result;
use futures::stream::Stream;
use std::pin::Pin;

use super::types::{Message, MessageResponse, StreamEvent, ToolDefinition};

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for chat-completion providers used by the desk runner.
///
/// All providers work with the internal message types in [`super::types`].
/// Providers whose wire format differs handle translation internally.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request with tools and system prompt, returning the full response.
    async fn send_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse>;

    /// Stream a request with tools and system prompt.
    ///
    /// Returns an async stream of StreamEvent that yields events as they arrive.
    async fn stream_with_tools_and_system(
        &self,
        model: &str,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<EventStream>;

    /// Default model (deployment) name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "azure-openai").
    fn provider_name(&self) -> &str;
}
