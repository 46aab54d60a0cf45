//! Hook Types
//!
//! Core types for the hooks system:
//! - `HookEvent` - The type of hook event
//! - `HookContext` - Mutable context passed to hooks
//! - `HookResult` - Result returned from hooks
//! - `HookDecision` - Allow or deny the intercepted operation

use serde_json::Value;

use crate::agents::HandoffData;
use crate::core::SupportContext;
use crate::llm::Message;
use crate::runtime::SessionInternals;
use crate::tools::ToolResult;

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before a tool is executed - can block or modify input
    PreToolUse,
    /// After a tool successfully executes
    PostToolUse,
    /// After a tool fails
    PostToolUseFailure,
    /// When the user submits a message
    UserPromptSubmit,
    /// When ownership moves to another agent - matched on the target's name
    Handoff,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::PreToolUse => write!(f, "PreToolUse"),
            HookEvent::PostToolUse => write!(f, "PostToolUse"),
            HookEvent::PostToolUseFailure => write!(f, "PostToolUseFailure"),
            HookEvent::UserPromptSubmit => write!(f, "UserPromptSubmit"),
            HookEvent::Handoff => write!(f, "Handoff"),
        }
    }
}

/// Mutable context passed to hooks
///
/// Hooks can read and modify anything here:
/// - Access session internals (item log, shared context, threads)
/// - Modify tool input
/// - Modify the user prompt
pub struct HookContext<'a> {
    /// The hook event type
    pub event: HookEvent,

    /// Full session internals
    pub internals: &'a mut SessionInternals,

    // === Tool-specific (populated for tool hooks) ===
    /// Tool name being called
    pub tool_name: Option<String>,

    /// Tool input - can be modified by hook
    pub tool_input: Option<Value>,

    /// Tool use ID
    pub tool_use_id: Option<String>,

    // === Results (for post hooks) ===
    /// Tool result (for PostToolUse)
    pub tool_result: Option<ToolResult>,

    /// Error message (for PostToolUseFailure)
    pub error: Option<String>,

    // === User input (for UserPromptSubmit) ===
    /// User prompt - can be modified by hook
    pub user_prompt: Option<String>,

    // === Handoff ===
    /// Source and target of the transfer
    pub handoff: Option<HandoffData>,

    /// Stop running hooks after the first Deny
    pub short_circuit_on_deny: bool,
}

impl<'a> HookContext<'a> {
    fn empty(event: HookEvent, internals: &'a mut SessionInternals) -> Self {
        Self {
            event,
            internals,
            tool_name: None,
            tool_input: None,
            tool_use_id: None,
            tool_result: None,
            error: None,
            user_prompt: None,
            handoff: None,
            short_circuit_on_deny: false,
        }
    }

    /// Create context for PreToolUse hook
    pub fn pre_tool_use(
        internals: &'a mut SessionInternals,
        tool_name: &str,
        tool_input: &Value,
        tool_use_id: &str,
    ) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            tool_input: Some(tool_input.clone()),
            tool_use_id: Some(tool_use_id.to_string()),
            ..Self::empty(HookEvent::PreToolUse, internals)
        }
    }

    /// Create context for PostToolUse hook
    pub fn post_tool_use(
        internals: &'a mut SessionInternals,
        tool_name: &str,
        tool_input: &Value,
        tool_use_id: &str,
        result: &ToolResult,
    ) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            tool_input: Some(tool_input.clone()),
            tool_use_id: Some(tool_use_id.to_string()),
            tool_result: Some(result.clone()),
            ..Self::empty(HookEvent::PostToolUse, internals)
        }
    }

    /// Create context for PostToolUseFailure hook
    pub fn post_tool_use_failure(
        internals: &'a mut SessionInternals,
        tool_name: &str,
        tool_input: &Value,
        tool_use_id: &str,
        error: &str,
    ) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            tool_input: Some(tool_input.clone()),
            tool_use_id: Some(tool_use_id.to_string()),
            error: Some(error.to_string()),
            ..Self::empty(HookEvent::PostToolUseFailure, internals)
        }
    }

    /// Create context for UserPromptSubmit hook
    pub fn user_prompt_submit(internals: &'a mut SessionInternals, prompt: &str) -> Self {
        Self {
            user_prompt: Some(prompt.to_string()),
            ..Self::empty(HookEvent::UserPromptSubmit, internals)
        }
    }

    /// Create context for Handoff hook
    pub fn handoff(internals: &'a mut SessionInternals, data: HandoffData) -> Self {
        Self {
            handoff: Some(data),
            ..Self::empty(HookEvent::Handoff, internals)
        }
    }

    /// Value the registry matches hook patterns against
    pub fn match_target(&self) -> Option<&str> {
        match self.event {
            HookEvent::Handoff => self.handoff.as_ref().map(|h| h.to_agent.name()),
            _ => self.tool_name.as_deref(),
        }
    }

    // === Convenience methods ===

    /// Get conversation history
    pub fn messages(&self) -> &[Message] {
        self.internals.session.history()
    }

    /// Get session ID
    pub fn session_id(&self) -> &str {
        self.internals.session_id()
    }

    /// Shared customer context
    pub fn context(&self) -> &SupportContext {
        self.internals.context()
    }

    /// Mutable shared customer context
    pub fn context_mut(&mut self) -> &mut SupportContext {
        self.internals.context_mut()
    }
}

/// Decision a hook can take about the intercepted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Explicitly let the operation proceed
    Allow,
    /// Block the operation, the model sees an error tool result
    Deny,
}

/// Result returned from a hook
///
/// For most hooks, just return `HookResult::none()`.
#[derive(Debug, Clone, Default)]
pub struct HookResult {
    pub decision: Option<HookDecision>,

    /// Reason for the decision (shown in error message if denied)
    pub reason: Option<String>,
}

impl HookResult {
    /// Allow the operation
    pub fn allow() -> Self {
        Self {
            decision: Some(HookDecision::Allow),
            reason: None,
        }
    }

    /// Deny the operation with a reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(HookDecision::Deny),
            reason: Some(reason.into()),
        }
    }

    /// No decision - continue with default behavior
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a reason to an existing result
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_denied(&self) -> bool {
        self.decision == Some(HookDecision::Deny)
    }
}
