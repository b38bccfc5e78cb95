//! Terminal rendering for messages, notifications, and receipts.
//!
//! Produces styled single-line strings so the loop can push them through the
//! shared readline writer without clobbering the prompt. Own messages carry
//! delivery marks: `(sending)` while pending, a tick once confirmed, a
//! double tick once read.

use console::style;
use uuid::Uuid;

use worklink_core::chat::controller::LocalMessage;
use worklink_types::chat::{ChatMessage, ChatSummary};
use worklink_types::realtime::NotificationKind;
use worklink_types::service::ServiceStatus;

/// First eight hex chars of a UUID, for compact display.
pub fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Renders conversation lines from one user's point of view.
pub struct ChatRenderer {
    self_id: Uuid,
}

impl ChatRenderer {
    pub fn new(self_id: Uuid) -> Self {
        Self { self_id }
    }

    /// One conversation entry, pending sends included.
    pub fn message_line(&self, entry: &LocalMessage) -> String {
        match entry {
            LocalMessage::Pending {
                content,
                sent_at,
                failed,
                ..
            } => {
                let mark = if *failed {
                    format!("{}", style("(failed)").red())
                } else {
                    format!("{}", style("(sending)").dim())
                };
                format!(
                    "  {} {} {} {}",
                    style(sent_at.format("%H:%M")).dim(),
                    style("you").green().bold(),
                    content,
                    mark
                )
            }
            LocalMessage::Confirmed(message) => self.confirmed_line(message),
        }
    }

    fn confirmed_line(&self, message: &ChatMessage) -> String {
        let when = style(message.sent_at.format("%H:%M")).dim();
        if message.sender_id == self.self_id {
            let mark = if message.read {
                format!("{}", style("✓✓").green())
            } else {
                format!("{}", style("✓").dim())
            };
            format!(
                "  {} {} {} {}",
                when,
                style("you").green().bold(),
                message.content,
                mark
            )
        } else {
            format!(
                "  {} {} {}",
                when,
                style(short_id(&message.sender_id)).cyan(),
                message.content
            )
        }
    }

    /// Inbox notification for a chat that is not currently on screen.
    pub fn notification_line(
        &self,
        kind: NotificationKind,
        chat_id: &Uuid,
        sender_id: &Uuid,
        content: &str,
    ) -> String {
        let label = match kind {
            NotificationKind::NewMessage => "message",
            NotificationKind::StatusUpdate => "status update",
        };
        format!(
            "  {} {label} in {} from {}: {}",
            style("•").cyan().bold(),
            style(short_id(chat_id)).cyan(),
            style(short_id(sender_id)).cyan(),
            style(content).dim()
        )
    }

    /// Service request status relay.
    pub fn service_line(&self, service_id: &Uuid, status: ServiceStatus) -> String {
        format!(
            "  {} service {} is now {}",
            style("•").magenta().bold(),
            style(short_id(service_id)).cyan(),
            style(status).bold()
        )
    }

    /// Read receipt for one of this user's own messages.
    pub fn receipt_line(&self) -> String {
        format!("  {}", style("✓✓ read").green().dim())
    }

    /// One row of the `/chats` listing.
    pub fn chat_summary_line(&self, summary: &ChatSummary) -> String {
        let last = match &summary.last_message {
            Some(message) => {
                let mut preview: String = message.content.chars().take(40).collect();
                if message.content.chars().count() > 40 {
                    preview.push('…');
                }
                preview
            }
            None => "(no messages yet)".to_string(),
        };
        format!(
            "  {}  {} participant(s)  {}",
            style(short_id(&summary.chat.id)).cyan().bold(),
            summary.chat.participants.len(),
            style(last).dim()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn renderer() -> (ChatRenderer, Uuid) {
        let me = Uuid::now_v7();
        (ChatRenderer::new(me), me)
    }

    #[test]
    fn pending_line_shows_sending_marker() {
        let (renderer, _) = renderer();
        let entry = LocalMessage::Pending {
            correlation: Uuid::now_v7(),
            content: "on my way".to_string(),
            sent_at: Utc::now(),
            failed: false,
        };
        let line = renderer.message_line(&entry);
        assert!(line.contains("on my way"));
        assert!(line.contains("(sending)"));
    }

    #[test]
    fn failed_line_shows_failed_marker() {
        let (renderer, _) = renderer();
        let entry = LocalMessage::Pending {
            correlation: Uuid::now_v7(),
            content: "lost".to_string(),
            sent_at: Utc::now(),
            failed: true,
        };
        assert!(renderer.message_line(&entry).contains("(failed)"));
    }

    #[test]
    fn own_confirmed_line_carries_tick() {
        let (renderer, me) = renderer();
        let message = ChatMessage::new(Uuid::now_v7(), me, "done".to_string());
        let line = renderer.message_line(&LocalMessage::Confirmed(message.clone()));
        assert!(line.contains("you"));
        assert!(line.contains("✓"));
        assert!(!line.contains("✓✓"));

        let mut read = message;
        read.mark_read(Utc::now());
        let line = renderer.message_line(&LocalMessage::Confirmed(read));
        assert!(line.contains("✓✓"));
    }

    #[test]
    fn other_sender_line_shows_short_id() {
        let (renderer, _) = renderer();
        let sender = Uuid::now_v7();
        let message = ChatMessage::new(Uuid::now_v7(), sender, "hi".to_string());
        let line = renderer.message_line(&LocalMessage::Confirmed(message));
        assert!(line.contains(&short_id(&sender)));
        assert!(!line.contains("you"));
    }

    #[test]
    fn summary_line_previews_last_message() {
        let (renderer, me) = renderer();
        let chat_id = Uuid::now_v7();
        let long = "x".repeat(60);
        let summary = ChatSummary {
            chat: worklink_types::chat::Chat {
                id: chat_id,
                participants: vec![me, Uuid::now_v7()],
                service_request_id: None,
                created_at: Utc::now(),
                message_count: 1,
            },
            last_message: Some(ChatMessage::new(chat_id, me, long)),
        };
        let line = renderer.chat_summary_line(&summary);
        assert!(line.contains(&short_id(&chat_id)));
        assert!(line.contains('…'));
    }
}
