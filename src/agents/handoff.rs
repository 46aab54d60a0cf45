//! Handoffs between agents
//!
//! A handoff is advertised to the model as a function tool with no
//! parameters. Calling it switches the agent that owns the conversation;
//! the new owner continues the same turn with the full item log.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::kind::AgentKind;
use crate::llm::{ToolDefinition, ToolInputSchema};

/// Tool name used to hand off to an agent, e.g. `transfer_to_faq_agent`
pub fn handoff_tool_name(agent_name: &str) -> String {
    let snake: String = agent_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("transfer_to_{}", snake)
}

/// An outbound edge of the handoff graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    /// Agent that takes over
    pub target: AgentKind,

    /// Function name the model calls
    pub tool_name: String,

    /// Shown to the model to help it decide when to hand off
    pub description: String,
}

impl Handoff {
    /// Handoff to `target`, described by the target's handoff description
    pub fn to(target: AgentKind) -> Self {
        Self {
            target,
            tool_name: handoff_tool_name(target.name()),
            description: target.handoff_description().to_string(),
        }
    }

    /// Tool definition advertised to the model
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.tool_name, &self.description, ToolInputSchema::new())
    }
}

/// What a handoff hook sees about the transfer in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffData {
    pub from_agent: AgentKind,
    pub to_agent: AgentKind,
}

/// Tool result recorded in the item log for a completed handoff
pub fn handoff_output(target: AgentKind) -> Value {
    json!({ "assistant": target.name() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(handoff_tool_name("FAQ Agent"), "transfer_to_faq_agent");
        assert_eq!(
            handoff_tool_name("Account Management Agent"),
            "transfer_to_account_management_agent"
        );
        assert_eq!(handoff_tool_name("Live Agent"), "transfer_to_live_agent");
        assert_eq!(handoff_tool_name("Triage Agent"), "transfer_to_triage_agent");
    }

    #[test]
    fn test_definition_has_empty_schema() {
        let def = Handoff::to(AgentKind::Live).definition();
        assert_eq!(def.name, "transfer_to_live_agent");
        assert!(def.description.contains("live human agent"));
        assert_eq!(def.input_schema.schema_type, "object");
        assert!(def.input_schema.required.is_empty());
        assert_eq!(def.input_schema.properties, json!({}));
    }

    #[test]
    fn test_handoff_output() {
        assert_eq!(
            handoff_output(AgentKind::Faq),
            json!({ "assistant": "FAQ Agent" })
        );
    }
}
