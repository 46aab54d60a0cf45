//! Agent personas

use std::sync::Arc;

use super::handoff::Handoff;
use super::kind::AgentKind;
use super::prompts::instructions_for;
use crate::llm::ToolDefinition;
use crate::tools::ToolRegistry;

/// One agent: instructions, tools, outbound handoffs and model binding
#[derive(Clone)]
pub struct AgentPersona {
    pub kind: AgentKind,

    /// System prompt sent with every model call this agent makes
    pub instructions: String,

    pub tools: Arc<ToolRegistry>,

    /// Outbound edges, in the order they are advertised
    pub handoffs: Vec<Handoff>,

    /// Deployment name of the chat model
    pub model: String,
}

impl AgentPersona {
    /// Persona with its standard instructions and no handoffs
    pub fn new(kind: AgentKind, model: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            kind,
            instructions: instructions_for(kind),
            tools: Arc::new(tools),
            handoffs: Vec::new(),
            model: model.into(),
        }
    }

    /// Add an outbound handoff
    pub fn with_handoff(mut self, target: AgentKind) -> Self {
        self.push_handoff(target);
        self
    }

    pub(crate) fn push_handoff(&mut self, target: AgentKind) {
        if !self.handoffs.iter().any(|h| h.target == target) {
            self.handoffs.push(Handoff::to(target));
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn handoff_description(&self) -> &'static str {
        self.kind.handoff_description()
    }

    /// Tools advertised to the model: function tools first, then handoffs
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = self.tools.get_definitions();
        defs.extend(self.handoffs.iter().map(Handoff::definition));
        defs
    }

    /// The handoff a tool name refers to, if this agent declares it
    pub fn handoff_for_tool(&self, tool_name: &str) -> Option<&Handoff> {
        self.handoffs.iter().find(|h| h.tool_name == tool_name)
    }
}

impl std::fmt::Debug for AgentPersona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentPersona")
            .field("name", &self.name())
            .field("tools", &self.tools.tool_names())
            .field(
                "handoffs",
                &self.handoffs.iter().map(|h| h.target).collect::<Vec<_>>(),
            )
            .field("model", &self.model)
            .finish()
    }
}
