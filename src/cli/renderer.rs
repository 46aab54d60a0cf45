//! Console Renderer - Subscribes to a session and renders output to terminal
//!
//! The `ConsoleRenderer` is an opt-in component that:
//! - Subscribes to a session's output stream
//! - Shows which agent is answering, streaming its reply as it arrives
//! - Shows the FAQ agent's lookup as a step with its own streamed output
//! - Reads user input, including `/attach` uploads
//!
//! This can be replaced with other renderers (web chat, etc.)

use std::io;

use tokio::sync::broadcast::error::RecvError;

use crate::core::{Attachment, OutputChunk};
use crate::runtime::{OutputReceiver, SessionHandle};
use crate::tools::FAQ_STEP_NAME;

use super::console::Console;

const FAQ_TOOL_NAME: &str = "faq_lookup_tool";

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// End the chat
    Exit,
    /// Queue a file for the next message
    Attach(String),
    /// Send a message
    Message(String),
    /// Nothing to do
    Empty,
}

impl UserCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return UserCommand::Empty;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return UserCommand::Exit;
        }
        match line.strip_prefix("/attach") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                let path = rest.trim();
                if path.is_empty() {
                    UserCommand::Empty
                } else {
                    UserCommand::Attach(path.to_string())
                }
            }
            _ => UserCommand::Message(line.to_string()),
        }
    }
}

/// Console renderer that subscribes to a session and handles terminal I/O
///
/// # Example
///
/// ```ignore
/// let handle = runtime.spawn(session, desk_fn).await;
/// let mut renderer = ConsoleRenderer::new(handle);
/// renderer.run().await?;
/// ```
pub struct ConsoleRenderer {
    /// The session handle to communicate with
    handle: SessionHandle,

    /// Output subscription, held for the whole chat so no chunk is missed
    output: OutputReceiver,

    /// The console for formatted output
    console: Console,

    /// Files queued by `/attach` for the next message
    pending_attachments: Vec<Attachment>,
}

impl ConsoleRenderer {
    /// Create a new console renderer for a session
    pub fn new(handle: SessionHandle) -> Self {
        Self::with_console(handle, Console::new())
    }

    /// Create a renderer with a custom console
    pub fn with_console(handle: SessionHandle, console: Console) -> Self {
        let output = handle.subscribe();
        Self {
            handle,
            output,
            console,
            pending_attachments: Vec::new(),
        }
    }

    /// Run the console renderer
    ///
    /// Returns when the user types "exit" or the session shuts down.
    pub async fn run(&mut self) -> io::Result<()> {
        self.console.print_banner();

        loop {
            let line = self.console.read_input()?;

            let text = match UserCommand::parse(&line) {
                UserCommand::Empty => continue,
                UserCommand::Exit => {
                    self.console.print_system("Ending chat...");
                    let _ = self.handle.shutdown().await;
                    break;
                }
                UserCommand::Attach(path) => {
                    let attachment = Attachment::from_path(path);
                    self.console.print_system(&format!(
                        "Attached {} ({})",
                        attachment.path, attachment.mime
                    ));
                    self.pending_attachments.push(attachment);
                    continue;
                }
                UserCommand::Message(text) => text,
            };

            let attachments = std::mem::take(&mut self.pending_attachments);
            if let Err(e) = self
                .handle
                .send_message_with_attachments(text, attachments)
                .await
            {
                self.console.print_error(&format!("Failed to send message: {}", e));
                break;
            }

            if !self.render_response().await {
                self.console.print_system("Session ended.");
                break;
            }
        }

        self.handle.wait_for_completion().await;
        Ok(())
    }

    /// Render output until the turn is done.
    ///
    /// Returns false if the session's output channel closed.
    pub async fn render_response(&mut self) -> bool {
        let mut agent = String::new();
        let mut thinking = false;
        let mut in_text = false;

        loop {
            let chunk = match self.output.recv().await {
                Ok(chunk) => chunk,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("[Renderer] Skipped {} output chunks", n);
                    continue;
                }
                Err(RecvError::Closed) => return false,
            };

            if thinking && !matches!(chunk, OutputChunk::StateChange(_)) {
                self.console.clear_thinking();
                thinking = false;
            }

            match chunk {
                OutputChunk::AgentUpdated(name) => {
                    if in_text {
                        self.console.println();
                        in_text = false;
                    }
                    agent = name;
                    self.console.print_thinking(&agent);
                    thinking = true;
                }
                OutputChunk::Handoff { from, to } => {
                    if in_text {
                        self.console.println();
                        in_text = false;
                    }
                    self.console.print_handoff(&from, &to);
                }

                OutputChunk::TextDelta(text) => {
                    if !in_text {
                        self.console.print_agent_prefix(&agent);
                        in_text = true;
                    }
                    self.console.print_agent_chunk(&text);
                }
                OutputChunk::TextComplete(_) => {
                    if in_text {
                        self.console.println();
                        in_text = false;
                    }
                }

                OutputChunk::ToolStart { name, input, .. } => {
                    if in_text {
                        self.console.println();
                        in_text = false;
                    }
                    let step = if name == FAQ_TOOL_NAME {
                        FAQ_STEP_NAME
                    } else {
                        name.as_str()
                    };
                    let question = input.get("question").and_then(|q| q.as_str());
                    self.console.print_step_start(step, question);
                }
                OutputChunk::ToolProgress { output, .. } => {
                    self.console.print_step_chunk(&output);
                }
                OutputChunk::ToolEnd { result, .. } => {
                    self.console.print_step_end(result.is_error);
                    self.console.print_thinking(&agent);
                    thinking = true;
                }

                OutputChunk::Status(status) => {
                    self.console.print_system(&status);
                }
                OutputChunk::StateChange(state) => {
                    tracing::debug!("[Renderer] Session state: {:?}", state);
                }

                // The message is already phrased for the customer
                OutputChunk::Error(message) => {
                    if in_text {
                        self.console.println();
                        in_text = false;
                    }
                    self.console.print_agent_prefix(&agent);
                    self.console.print_agent_chunk(&message);
                    self.console.println();
                }
                OutputChunk::Done => {
                    if in_text {
                        self.console.println();
                    }
                    self.console.print_separator();
                    return true;
                }
            }
        }
    }

    /// Get the underlying session handle
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Get the underlying console
    pub fn console(&self) -> &Console {
        &self.console
    }
}
