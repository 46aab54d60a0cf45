//! Multi-agent customer support desk
//!
//! A triage agent routes each customer message to a specialist: an FAQ agent
//! backed by a hosted retrieval agent, an account management agent that
//! updates the customer's user name, and a live agent persona. Agents hand
//! the conversation to each other along a fixed graph, and the owning agent
//! persists across messages.

pub mod core;
pub mod runtime;
pub mod session;
pub mod tools;

// Model access and the hosted agent service
pub mod llm;
pub mod threads;

// Agents, their handoff graph and the runner that drives them
pub mod agents;
pub mod desk;

// Hooks for intercepting tool calls and handoffs
pub mod hooks;

// Process setup and terminal UI
pub mod cli;
pub mod config;
pub mod logging;

#[cfg(test)]
mod testing;
