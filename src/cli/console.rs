use colored::*;
use std::io::{self, Write};

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    user_color: Color,
    agent_color: Color,
    step_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            agent_color: Color::Green,
            step_color: Color::Magenta,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(user_color: Color, agent_color: Color, step_color: Color) -> Self {
        Self {
            user_color,
            agent_color,
            step_color,
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }

    /// Print a user message with colored formatting
    pub fn print_user(&self, message: &str) {
        println!("{} {}", "User:".color(self.user_color).bold(), message);
    }

    /// Show that `agent` is working on a reply
    pub fn print_thinking(&self, agent: &str) {
        print!(
            "{} {}",
            format!("[{}]", agent).color(self.agent_color).bold(),
            "thinking...".bright_black()
        );
        self.flush();
    }

    /// Clear the thinking indicator
    pub fn clear_thinking(&self) {
        print!("\r{}\r", " ".repeat(60));
        self.flush();
    }

    /// Print the reply prefix for `agent` (without newline)
    pub fn print_agent_prefix(&self, agent: &str) {
        print!("{} ", format!("[{}]", agent).color(self.agent_color).bold());
        self.flush();
    }

    /// Print a chunk of agent reply (for streaming)
    pub fn print_agent_chunk(&self, chunk: &str) {
        print!("{}", chunk.color(self.agent_color));
        self.flush();
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a handoff notice
    pub fn print_handoff(&self, from: &str, to: &str) {
        println!(
            "{} {} {} {}",
            "Handoff:".yellow().bold(),
            from,
            "->".bright_black(),
            to.yellow()
        );
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Open a step block, e.g. the FAQ agent answering `input`
    pub fn print_step_start(&self, step: &str, input: Option<&str>) {
        println!("{}", format!("┌─ {}", step).color(self.step_color).bold());
        if let Some(input) = input {
            println!("{} {}", "│".color(self.step_color), input.bright_black().italic());
        }
    }

    /// Print streamed step output
    pub fn print_step_chunk(&self, chunk: &str) {
        print!("{}", chunk.bright_black());
        self.flush();
    }

    /// Close a step block
    pub fn print_step_end(&self, is_error: bool) {
        println!();
        if is_error {
            println!("{}", "└─ failed".red());
        } else {
            println!("{}", "└─ done".color(self.step_color));
        }
    }

    /// Read a line of input from the user
    pub fn read_input(&self) -> io::Result<String> {
        print!("{} ", ">".color(self.user_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    /// Print a welcome banner
    pub fn print_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  Customer Support Desk".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Type your message and press Enter. Type 'exit' or 'quit' to end the chat.");
        println!("Use '/attach <path>' to upload a file with your next message.");
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
