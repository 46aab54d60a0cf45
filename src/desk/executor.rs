//! Tool Executor
//!
//! Runs one function tool call with hooks and UI notifications.

use serde_json::Value;

use crate::hooks::{HookContext, HookRegistry};
use crate::runtime::SessionInternals;
use crate::tools::{ToolRegistry, ToolResult};

/// Handles tool execution with hooks
pub struct ToolExecutor;

impl ToolExecutor {
    /// Execute a tool call
    ///
    /// 1. Run PreToolUse hooks (can block or rewrite the input)
    /// 2. Announce the call and execute it
    /// 3. Run PostToolUse or PostToolUseFailure hooks
    ///
    /// Never fails: errors become error results for the model.
    pub async fn execute(
        internals: &mut SessionInternals,
        tools: &ToolRegistry,
        hooks: Option<&HookRegistry>,
        tool_name: &str,
        tool_id: &str,
        input: &Value,
    ) -> ToolResult {
        let mut current_input = input.clone();

        if let Some(hooks) = hooks {
            let mut ctx = HookContext::pre_tool_use(internals, tool_name, &current_input, tool_id);
            let result = hooks.run(&mut ctx);

            if let Some(modified_input) = ctx.tool_input {
                current_input = modified_input;
            }

            if result.is_denied() {
                let reason = result
                    .reason
                    .unwrap_or_else(|| "Blocked by hook".to_string());
                tracing::info!("[Executor] Hook denied {}: {}", tool_name, reason);
                return ToolResult::error(format!("Hook denied: {}", reason));
            }
        }

        internals.current_tool_use_id = Some(tool_id.to_string());
        internals.set_executing_tool(tool_name, tool_id).await;
        tracing::info!(
            "[Executor] Elapsed time: {:.2} seconds - {}",
            internals.turn_elapsed().as_secs_f64(),
            tool_name
        );
        internals.send_tool_start(tool_id, tool_name, current_input.clone());

        let result = match tools.execute(tool_name, &current_input, internals).await {
            Ok(result) => {
                if let Some(hooks) = hooks {
                    let mut ctx = HookContext::post_tool_use(
                        internals,
                        tool_name,
                        &current_input,
                        tool_id,
                        &result,
                    );
                    hooks.run(&mut ctx);
                }
                result
            }
            Err(e) => {
                let error_msg = format!("Tool execution failed: {:#}", e);
                tracing::warn!("[Executor] {} failed: {:#}", tool_name, e);

                if let Some(hooks) = hooks {
                    let mut ctx = HookContext::post_tool_use_failure(
                        internals,
                        tool_name,
                        &current_input,
                        tool_id,
                        &error_msg,
                    );
                    hooks.run(&mut ctx);
                }

                ToolResult::error(error_msg)
            }
        };

        internals.send_tool_end(tool_id, result.clone());
        internals.current_tool_use_id = None;
        internals.set_processing().await;

        result
    }
}
