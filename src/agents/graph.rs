//! The handoff graph of the support desk
//!
//! ```text
//!            +--> FAQ Agent ----------------+
//!            |                              |
//! Triage ----+--> Account Management Agent -+--> Triage
//!            |                              |
//!            +--> Live Agent ---------------+
//! ```
//!
//! No other edge exists. Entering account management runs the handoff hook
//! that stamps the customer's user ID.

use super::handoff::handoff_tool_name;
use super::kind::AgentKind;
use super::persona::AgentPersona;
use crate::core::{DeskError, DeskResult};
use crate::tools::{Tool, ToolRegistry, UpdateUserNameTool};

/// All four personas, wired together
#[derive(Debug, Clone)]
pub struct AgentGraph {
    triage: AgentPersona,
    faq: AgentPersona,
    account_management: AgentPersona,
    live: AgentPersona,
}

impl AgentGraph {
    /// Build the standard desk.
    ///
    /// Specialists are built first, then triage with its forward edges, and
    /// finally each specialist gets its edge back to triage.
    pub fn support_desk<T: Tool + 'static>(model: &str, faq_tool: T) -> Self {
        let mut faq_tools = ToolRegistry::new();
        faq_tools.register(faq_tool);
        let mut faq = AgentPersona::new(AgentKind::Faq, model, faq_tools);

        let mut account_tools = ToolRegistry::new();
        account_tools.register(UpdateUserNameTool);
        let mut account_management =
            AgentPersona::new(AgentKind::AccountManagement, model, account_tools);

        let mut live = AgentPersona::new(AgentKind::Live, model, ToolRegistry::new());

        let triage = AgentPersona::new(AgentKind::Triage, model, ToolRegistry::new())
            .with_handoff(AgentKind::AccountManagement)
            .with_handoff(AgentKind::Faq)
            .with_handoff(AgentKind::Live);

        for specialist in [&mut faq, &mut account_management, &mut live] {
            specialist.push_handoff(AgentKind::Triage);
        }

        Self {
            triage,
            faq,
            account_management,
            live,
        }
    }

    /// Persona for an agent
    pub fn persona(&self, kind: AgentKind) -> &AgentPersona {
        match kind {
            AgentKind::Triage => &self.triage,
            AgentKind::Faq => &self.faq,
            AgentKind::AccountManagement => &self.account_management,
            AgentKind::Live => &self.live,
        }
    }

    /// Classify a tool call made by `from`.
    ///
    /// Returns `None` when the name is not a handoff tool at all, the target
    /// when `from` declares that edge, and `HandoffRejected` when the name
    /// names an agent `from` cannot reach.
    pub fn resolve_handoff(
        &self,
        from: AgentKind,
        tool_name: &str,
    ) -> Option<DeskResult<AgentKind>> {
        if let Some(handoff) = self.persona(from).handoff_for_tool(tool_name) {
            return Some(Ok(handoff.target));
        }

        AgentKind::ALL
            .into_iter()
            .find(|kind| handoff_tool_name(kind.name()) == tool_name)
            .map(|target| {
                Err(DeskError::HandoffRejected {
                    from: from.name().to_string(),
                    to: target.name().to_string(),
                })
            })
    }
}
