pub mod auth;
pub mod azure_openai;
pub mod provider;
pub mod types;

pub use auth::{auth_provider, AuthConfig, AuthProvider, FnAuthProvider};
pub use azure_openai::AzureOpenAiProvider;
pub use provider::{EventStream, LlmProvider};
pub use types::{
    ContentBlock, ContentBlockDeltaEvent, ContentBlockStart, ContentBlockStartEvent,
    ContentBlockStopEvent, ContentDelta, Message, MessageContent, MessageResponse, StopReason,
    StreamError, StreamEvent, ToolDefinition, ToolInputSchema, Usage,
};
