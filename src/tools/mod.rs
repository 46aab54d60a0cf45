//! Tools the agents can call
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - The tools of one agent
//! - `FaqLookupTool` - FAQ answers from the hosted FAQ agent
//! - `UpdateUserNameTool` - Identity update for account management

mod faq_lookup;
mod registry;
mod tool;
mod update_user_name;

pub use faq_lookup::{FaqLookupTool, FAQ_STEP_NAME};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolResult};
pub use update_user_name::UpdateUserNameTool;
