//! The support desk runner
//!
//! - `SupportDesk` - Session loop driving the owning agent, tools and handoffs
//! - `DeskConfig` - Runner configuration (builder style)
//! - `ToolExecutor` - Hook-aware function tool execution

pub mod config;
pub mod executor;
pub mod runner;

pub use config::{DeskConfig, DEFAULT_MAX_TURNS};
pub use executor::ToolExecutor;
pub use runner::SupportDesk;
