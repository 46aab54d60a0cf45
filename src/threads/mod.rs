//! Remote agent runtime
//!
//! The FAQ lookup delegates to an agent hosted in the agent service. This
//! module holds the client for that service and the per-session record of
//! which remote thread is in use.

pub mod client;
pub mod session_threads;
pub mod types;

pub use client::{
    AgentServiceClient, ConnectionString, RunEventStream, ThreadService, AGENTS_API_VERSION,
};
pub use session_threads::SessionThreads;
pub use types::{parse_run_event, RunStreamEvent};
