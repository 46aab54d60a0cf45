//! The four agents of the support desk

use serde::{Deserialize, Serialize};

/// Identity of an agent persona.
///
/// Agents refer to each other by kind, never by pointer, so the graph's
/// back-edges to triage need no shared ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Triage,
    Faq,
    AccountManagement,
    Live,
}

impl AgentKind {
    /// Every agent, triage first
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Triage,
        AgentKind::Faq,
        AgentKind::AccountManagement,
        AgentKind::Live,
    ];

    /// Display name, also the source of the handoff tool name
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Triage => "Triage Agent",
            AgentKind::Faq => "FAQ Agent",
            AgentKind::AccountManagement => "Account Management Agent",
            AgentKind::Live => "Live Agent",
        }
    }

    /// What another agent is told about this one when deciding to hand off
    pub fn handoff_description(&self) -> &'static str {
        match self {
            AgentKind::Triage => {
                "A triage agent that can delegate a customer's request to the appropriate agent."
            }
            AgentKind::Faq => {
                "A helpful agent that can answer questions about BHP Operational Review."
            }
            AgentKind::AccountManagement => {
                "A helpful agent that can update customer user name."
            }
            AgentKind::Live => {
                "A live human agent that can handle complex issues or when a user specifically requests human assistance."
            }
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
