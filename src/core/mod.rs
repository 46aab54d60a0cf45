//! Core types for the support desk
//!
//! This module provides the fundamental types used throughout the crate:
//! - `SupportContext` - Customer facts shared by all agents in a session
//! - `SessionState` - Current state of a chat session
//! - `OutputChunk` / `InputMessage` - Communication types
//! - `DeskError` - Error types

pub mod context;
pub mod error;
pub mod output;
pub mod state;

pub use context::SupportContext;
pub use error::{DeskError, DeskResult};
pub use output::{Attachment, InputMessage, OutputChunk};
pub use state::SessionState;

/// Text shown to the user whenever a turn or the FAQ lookup fails
pub const APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";
