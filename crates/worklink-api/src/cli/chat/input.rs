//! Async readline input handling for the chat client.
//!
//! Wraps `rustyline_async::Readline` so the main loop can `select!` between
//! user input and WebSocket frames. The paired `SharedWriter` lets incoming
//! events print without clobbering the prompt line.

use rustyline_async::{Readline, ReadlineError, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug)]
pub enum InputEvent {
    /// User submitted a line.
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create a new input handler with the given initial prompt.
    ///
    /// Returns the handler and a `SharedWriter` for printing output
    /// while the prompt is active.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt)?;
        Ok((Self { rl }, writer))
    }

    /// Update the prompt, e.g. after opening a different chat.
    pub fn update_prompt(&mut self, prompt: &str) {
        let _ = self.rl.update_prompt(prompt);
    }

    /// Read a line of input.
    ///
    /// Cancel-safe, so it can sit in a `select!` arm next to the socket.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(rustyline_async::ReadlineEvent::Line(line)) => {
                InputEvent::Message(line.trim().to_string())
            }
            Ok(rustyline_async::ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(rustyline_async::ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }
}
