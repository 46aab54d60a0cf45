//! Per-user chat session state
//!
//! A `ChatSession` lives for the duration of one chat and is never persisted.

pub mod session;

pub use session::{ChatSession, TurnSnapshot};
