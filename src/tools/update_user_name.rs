//! Identity update tool used by the account management agent

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::tool::{required_str, Tool, ToolResult};
use crate::llm::{ToolDefinition, ToolInputSchema};
use crate::runtime::SessionInternals;

/// Updates the customer's user name, ID image path and birth date.
///
/// The user ID must already have been stamped by the account management
/// handoff; without it the call fails.
pub struct UpdateUserNameTool;

#[async_trait]
impl Tool for UpdateUserNameTool {
    fn name(&self) -> &str {
        "update_user_name"
    }

    fn description(&self) -> &str {
        "Update the customer user name using government ID or passport image and birth date."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name(),
            self.description(),
            ToolInputSchema::new()
                .with_properties(json!({
                    "user_name": {
                        "type": "string",
                        "description": "The new customer user name."
                    },
                    "image_path": {
                        "type": "string",
                        "description": "Image file path of the government ID or passport."
                    },
                    "birth_date": {
                        "type": "string",
                        "description": "The customer birth date."
                    }
                }))
                .with_required(vec![
                    "user_name".to_string(),
                    "image_path".to_string(),
                    "birth_date".to_string(),
                ]),
        )
    }

    async fn execute(
        &self,
        input: &Value,
        internals: &mut SessionInternals,
    ) -> Result<ToolResult> {
        let user_name = required_str(input, "user_name")?;
        let image_path = required_str(input, "image_path")?;
        let birth_date = required_str(input, "birth_date")?;

        let context = internals.context_mut();
        context.update_identity(user_name, image_path, birth_date);
        tracing::info!("[UpdateUserName] Context now {:?}", context);

        if !context.has_user_id() {
            return Ok(ToolResult::error("User ID is required"));
        }

        Ok(ToolResult::success(format!(
            "Updated user name to {}. ID image saved successfully.",
            user_name
        )))
    }
}
