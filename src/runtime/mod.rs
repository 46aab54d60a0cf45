//! Session runtime and communication
//!
//! This module provides the infrastructure for running chat sessions:
//! - `ChatRuntime` - Spawns and tracks session tasks
//! - `SessionHandle` - The UI's interface to a running session
//! - `SessionInternals` - State and channel ends owned by the session task
//! - Channel types for input/output communication
//!
//! Each session runs as its own tokio task and communicates via channels.

pub mod channels;
pub mod handle;
pub mod internals;
pub mod runtime;

pub use channels::{
    create_session_channels, InputReceiver, InputSender, OutputReceiver, OutputSender,
};
pub use handle::SessionHandle;
pub use internals::SessionInternals;
pub use runtime::ChatRuntime;
