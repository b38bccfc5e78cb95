//! Slash command parsing and execution for the chat client.
//!
//! Commands start with `/` and provide in-chat controls for switching
//! conversations, relaying service status updates, and help.

use console::style;

/// Available slash commands in the chat client.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// List the user's chats.
    Chats,
    /// Open a chat by id.
    Open(String),
    /// Relay a status update for the chat's linked service request.
    Status(String),
    /// Show available commands.
    Help,
    /// Exit the chat client.
    Quit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim().to_string());

    match cmd.as_str() {
        "/chats" | "/ls" => Some(ChatCommand::Chats),
        "/open" | "/o" => match arg {
            Some(id) if !id.is_empty() => Some(ChatCommand::Open(id)),
            _ => Some(ChatCommand::Unknown("/open requires a chat id".to_string())),
        },
        "/status" | "/st" => match arg {
            Some(status) if !status.is_empty() => Some(ChatCommand::Status(status)),
            _ => Some(ChatCommand::Unknown(
                "/status requires a status value".to_string(),
            )),
        },
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/quit" | "/exit" | "/q" => Some(ChatCommand::Quit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Format the help text listing all available commands.
pub fn help_text() -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  {}\n\n", style("Available commands:").bold()));
    out.push_str(&format!(
        "  {}           {}\n",
        style("/chats").cyan(),
        "List your chats"
    ));
    out.push_str(&format!(
        "  {}       {}\n",
        style("/open <id>").cyan(),
        "Open a chat"
    ));
    out.push_str(&format!(
        "  {} {}\n",
        style("/status <status>").cyan(),
        "Update the linked service request"
    ));
    out.push_str(&format!(
        "  {}            {}\n",
        style("/help").cyan(),
        "Show this help message"
    ));
    out.push_str(&format!(
        "  {}            {}\n",
        style("/quit").cyan(),
        "Leave the chat client"
    ));
    out.push('\n');
    out.push_str(&format!(
        "  {}\n",
        style("Ctrl+D to exit. Statuses: pending, accepted, in_progress, completed, cancelled").dim()
    ));
    out
}
