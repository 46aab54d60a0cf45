//! Hooks Module
//!
//! Intercept and extend desk behavior at key execution points.
//!
//! # Hook Events
//!
//! | Event | When | Matched on | Can modify |
//! |-------|------|------------|------------|
//! | `PreToolUse` | Before tool executes | tool name | `tool_input`, context, decision |
//! | `PostToolUse` | After tool succeeds | tool name | context |
//! | `PostToolUseFailure` | After tool fails | tool name | context |
//! | `UserPromptSubmit` | When user sends a message | - | `user_prompt`, context |
//! | `Handoff` | When ownership moves | target agent name | context, decision |
//!
//! # Example
//!
//! ```ignore
//! use triage_desk::hooks::{support_desk_hooks, HookEvent, HookResult};
//!
//! let mut hooks = support_desk_hooks()?;
//! hooks.add_with_pattern(HookEvent::PreToolUse, "faq_lookup_tool", |ctx| {
//!     tracing::info!("FAQ lookup in {}", ctx.session_id());
//!     HookResult::none()
//! })?;
//! ```
//!
//! # HookResult
//!
//! | Method | Effect |
//! |--------|--------|
//! | `HookResult::none()` | Continue normally |
//! | `HookResult::allow()` | Continue, recorded as an explicit allow |
//! | `HookResult::deny("reason")` | Block the tool call or handoff, error goes to the model |

mod builtin;
mod registry;
mod types;

pub use builtin::{assign_user_id, support_desk_hooks};
pub use registry::{ArcHook, Hook, HookMatcher, HookRegistry};
pub use types::{HookContext, HookDecision, HookEvent, HookResult};
