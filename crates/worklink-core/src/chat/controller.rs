//! Client-side chat state for one open conversation.
//!
//! `ChatController` merges REST-fetched history with live socket events
//! and reconciles optimistic sends. It owns no I/O: the host fetches,
//! sends, and renders; the controller decides what the message list
//! looks like and which messages still need a read mark.
//!
//! Every message carries at most one entry here. Server messages are
//! deduplicated by id, and an optimistic send converges to a single
//! confirmed entry whether its REST acknowledgement or its socket echo
//! arrives first.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use worklink_types::chat::ChatMessage;

/// One entry in the local message list.
#[derive(Debug, Clone)]
pub enum LocalMessage {
    /// Optimistic send awaiting server confirmation. The correlation id
    /// is client-local and never crosses the wire.
    Pending {
        correlation: Uuid,
        content: String,
        sent_at: DateTime<Utc>,
        /// Set when the durable send failed; retry is a deliberate,
        /// visible action rather than an automatic one.
        failed: bool,
    },
    /// Server-confirmed message.
    Confirmed(ChatMessage),
}

/// Local state machine for the active conversation view.
pub struct ChatController {
    chat_id: Uuid,
    user_id: Uuid,
    messages: Vec<LocalMessage>,
    /// Server ids already present, for socket-echo dedup.
    known_ids: HashSet<Uuid>,
    /// Ids already handed out by `take_unread`.
    read_requested: HashSet<Uuid>,
}

impl ChatController {
    /// Create a controller for `chat_id` viewed as `user_id`.
    pub fn new(chat_id: Uuid, user_id: Uuid) -> Self {
        Self {
            chat_id,
            user_id,
            messages: Vec::new(),
            known_ids: HashSet::new(),
            read_requested: HashSet::new(),
        }
    }

    pub fn chat_id(&self) -> Uuid {
        self.chat_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The current message list, oldest first, pending sends in place.
    pub fn messages(&self) -> &[LocalMessage] {
        &self.messages
    }

    /// Seed the list from a history fetch, replacing whatever was held.
    pub fn load_history(&mut self, history: Vec<ChatMessage>) {
        self.messages.clear();
        self.known_ids.clear();
        self.read_requested.clear();
        for message in history {
            if message.chat_id == self.chat_id && self.known_ids.insert(message.id) {
                self.messages.push(LocalMessage::Confirmed(message));
            }
        }
    }

    /// Apply a live `new_message` event.
    ///
    /// Returns `true` if the message was appended; `false` when it
    /// belongs to another chat or its id is already present (the echo
    /// of an already-acknowledged optimistic send lands here).
    pub fn apply_incoming(&mut self, message: ChatMessage) -> bool {
        if message.chat_id != self.chat_id || !self.known_ids.insert(message.id) {
            return false;
        }
        self.messages.push(LocalMessage::Confirmed(message));
        true
    }

    /// Start an optimistic send and return its correlation id.
    ///
    /// The entry renders immediately as pending; the host passes the
    /// correlation id back to `complete_send` or `fail_send` once the
    /// durable send resolves.
    pub fn begin_send(&mut self, content: String) -> Uuid {
        let correlation = Uuid::now_v7();
        self.messages.push(LocalMessage::Pending {
            correlation,
            content,
            sent_at: Utc::now(),
            failed: false,
        });
        correlation
    }

    /// Resolve an optimistic send with the server's message.
    ///
    /// If the socket echo already inserted the confirmed message, the
    /// pending entry is simply removed; otherwise it is confirmed in
    /// place, keeping its position in the list.
    pub fn complete_send(&mut self, correlation: Uuid, message: ChatMessage) {
        let position = self.messages.iter().position(|entry| {
            matches!(entry, LocalMessage::Pending { correlation: c, .. } if *c == correlation)
        });
        let Some(position) = position else {
            // Unknown correlation: late ack after a reload. Treat the
            // message as a live arrival so it is not lost.
            self.apply_incoming(message);
            return;
        };

        if message.chat_id == self.chat_id && self.known_ids.insert(message.id) {
            self.messages[position] = LocalMessage::Confirmed(message);
        } else {
            self.messages.remove(position);
        }
    }

    /// Mark an optimistic send as failed, keeping it visible.
    pub fn fail_send(&mut self, correlation: Uuid) -> bool {
        for entry in &mut self.messages {
            if let LocalMessage::Pending {
                correlation: c,
                failed,
                ..
            } = entry
                && *c == correlation
            {
                *failed = true;
                return true;
            }
        }
        false
    }

    /// Apply a `message_read` receipt to one of this user's messages.
    pub fn apply_read(&mut self, message_id: Uuid, read_at: DateTime<Utc>) -> bool {
        for entry in &mut self.messages {
            if let LocalMessage::Confirmed(message) = entry
                && message.id == message_id
                && !message.read
            {
                message.mark_read(read_at);
                return true;
            }
        }
        false
    }

    /// Ids of other participants' unread messages, each yielded exactly
    /// once. The host issues a `mark_as_read` for every id returned.
    pub fn take_unread(&mut self) -> Vec<Uuid> {
        let mut due = Vec::new();
        for entry in &self.messages {
            if let LocalMessage::Confirmed(message) = entry
                && message.sender_id != self.user_id
                && !message.read
                && !self.read_requested.contains(&message.id)
            {
                due.push(message.id);
            }
        }
        for id in &due {
            self.read_requested.insert(*id);
        }
        due
    }
}
