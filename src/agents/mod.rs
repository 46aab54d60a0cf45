//! Agent personas and the handoff graph
//!
//! - `AgentKind` - Identity of each of the four agents
//! - `AgentPersona` - Instructions, tools, handoffs and model of one agent
//! - `Handoff` / `HandoffData` - Edges of the graph and what hooks see of them
//! - `AgentGraph` - The wired-up desk: triage plus three specialists

pub mod graph;
pub mod handoff;
pub mod kind;
pub mod persona;
pub mod prompts;

pub use graph::AgentGraph;
pub use handoff::{handoff_output, handoff_tool_name, Handoff, HandoffData};
pub use kind::AgentKind;
pub use persona::AgentPersona;
pub use prompts::{instructions_for, HANDOFF_PROMPT_PREFIX};
