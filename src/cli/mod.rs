//! Terminal chat UI
//!
//! - `Console` - Colored terminal output and line input
//! - `ConsoleRenderer` - Drives a chat session from the terminal

pub mod console;
pub mod renderer;

pub use console::Console;
pub use renderer::{ConsoleRenderer, UserCommand};
