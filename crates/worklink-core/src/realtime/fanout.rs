//! Notification derivation for message fan-out.
//!
//! Pure helpers: who hears about a message, and how much of it they
//! hear. Delivery itself goes through the room registry.

use uuid::Uuid;
use worklink_types::chat::Chat;

/// Characters of message content carried in a notification before
/// truncation kicks in.
pub const PREVIEW_CHARS: usize = 50;

/// Everyone who should be notified about a message: the chat's
/// participants minus the sender.
pub fn notification_targets(chat: &Chat, sender_id: Uuid) -> Vec<Uuid> {
    chat.participants
        .iter()
        .copied()
        .filter(|id| *id != sender_id)
        .collect()
}

/// Notification preview of message content.
///
/// Content longer than `PREVIEW_CHARS` Unicode scalar values is cut to
/// the first `PREVIEW_CHARS` plus a single ellipsis character; shorter
/// content passes through unchanged.
pub fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
