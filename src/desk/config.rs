//! Desk Configuration
//!
//! Options for the `SupportDesk` runner.

use std::sync::Arc;

use crate::hooks::HookRegistry;

/// Default limit on model calls per user message
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Configuration for a SupportDesk
///
/// ```ignore
/// let config = DeskConfig::new()
///     .with_max_turns(10)
///     .with_streaming(true)
///     .with_hooks(support_desk_hooks()?);
/// ```
pub struct DeskConfig {
    /// Maximum model calls while handling one user message
    pub max_turns: usize,

    /// Whether to stream model responses
    pub streaming_enabled: bool,

    /// Hooks for tool calls, handoffs and user prompts
    pub hooks: Option<Arc<HookRegistry>>,
}

impl DeskConfig {
    pub fn new() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            streaming_enabled: true,
            hooks: None,
        }
    }

    /// Set maximum model calls per user message
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    /// Enable or disable streaming responses
    ///
    /// When disabled, each model response is fetched whole and sent to the
    /// UI as a single text delta.
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    /// Set the hook registry
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeskConfig")
            .field("max_turns", &self.max_turns)
            .field("streaming_enabled", &self.streaming_enabled)
            .field("hooks", &self.hooks.as_ref().map(|h| format!("{:?}", h)))
            .finish()
    }
}
