//! Room registry: the in-memory map from logical rooms to live connections.
//!
//! Each WebSocket connection owns a bounded `mpsc` mailbox; joining a room
//! stores a sender clone under that room. Broadcasting walks the room's
//! members and prunes any whose mailbox has closed, so a vanished
//! connection cannot linger. Membership is rebuilt from scratch when the
//! process restarts.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;
use worklink_types::realtime::{Room, ServerEvent};

/// Buffer size for per-connection outbound mailboxes (mpsc).
///
/// A client that cannot drain this many pending events loses the
/// overflow; live delivery is best-effort and the store remains the
/// source of truth.
const OUTBOUND_BUFFER: usize = 256;

/// A connection's presence in one room.
struct RoomMember {
    connection_id: Uuid,
    sender: mpsc::Sender<ServerEvent>,
}

/// In-memory registry of room memberships.
///
/// Owned by the gateway and injected into it, never ambient global
/// state. All operations are lock-free reads/writes on sharded maps and
/// safe to call from any task.
#[derive(Default)]
pub struct RoomRegistry {
    /// Room -> current members.
    rooms: DashMap<Room, Vec<RoomMember>>,
    /// Reverse index: connection -> rooms joined, for disconnect cleanup.
    memberships: DashMap<Uuid, HashSet<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the outbound mailbox for a new connection.
    ///
    /// The receiver half is pumped by the connection's socket task; the
    /// sender half is what `join` stores under each room.
    pub fn open_mailbox() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        mpsc::channel(OUTBOUND_BUFFER)
    }

    /// Add a connection to a room.
    ///
    /// Idempotent: joining a room the connection is already in replaces
    /// its stored sender and reports `false`. Returns `true` when the
    /// connection is newly joined.
    pub fn join(&self, room: Room, connection_id: Uuid, sender: mpsc::Sender<ServerEvent>) -> bool {
        let newly_joined = {
            let mut members = self.rooms.entry(room).or_default();
            match members
                .iter_mut()
                .find(|m| m.connection_id == connection_id)
            {
                Some(member) => {
                    member.sender = sender;
                    false
                }
                None => {
                    members.push(RoomMember {
                        connection_id,
                        sender,
                    });
                    true
                }
            }
        };

        if newly_joined {
            self.memberships
                .entry(connection_id)
                .or_default()
                .insert(room);
            debug!(%room, %connection_id, "connection joined room");
        }
        newly_joined
    }

    /// Remove a connection from a room.
    ///
    /// Returns `true` if the connection was a member. Idempotent.
    pub fn leave(&self, room: &Room, connection_id: &Uuid) -> bool {
        let was_member = {
            let Some(mut members) = self.rooms.get_mut(room) else {
                return false;
            };
            let before = members.len();
            members.retain(|m| m.connection_id != *connection_id);
            members.len() < before
        };
        self.rooms.remove_if(room, |_, members| members.is_empty());

        if was_member {
            if let Some(mut rooms) = self.memberships.get_mut(connection_id) {
                rooms.remove(room);
            }
            self.memberships
                .remove_if(connection_id, |_, rooms| rooms.is_empty());
            debug!(%room, %connection_id, "connection left room");
        }
        was_member
    }

    /// Remove a connection from every room it joined.
    ///
    /// Called on disconnect; has no durable side effects.
    pub fn drop_connection(&self, connection_id: &Uuid) {
        let Some((_, rooms)) = self.memberships.remove(connection_id) else {
            return;
        };
        for room in rooms {
            if let Some(mut members) = self.rooms.get_mut(&room) {
                members.retain(|m| m.connection_id != *connection_id);
            }
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }
        debug!(%connection_id, "connection dropped from all rooms");
    }

    /// Deliver an event to every current member of a room.
    ///
    /// Fire-and-forget: a full mailbox drops this event for that member,
    /// a closed mailbox evicts the member. Returns the number of
    /// mailboxes the event was handed to. A room with no members is not
    /// an error.
    pub fn broadcast(&self, room: &Room, event: &ServerEvent) -> usize {
        let mut delivered = 0;
        let mut stale: Vec<Uuid> = Vec::new();

        if let Some(mut members) = self.rooms.get_mut(room) {
            members.retain(|member| match member.sender.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%room, connection_id = %member.connection_id, "outbound mailbox full, event dropped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    stale.push(member.connection_id);
                    false
                }
            });
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());

        for connection_id in stale {
            if let Some(mut rooms) = self.memberships.get_mut(&connection_id) {
                rooms.remove(room);
            }
            self.memberships
                .remove_if(&connection_id, |_, rooms| rooms.is_empty());
            debug!(%room, %connection_id, "evicted closed connection during broadcast");
        }

        delivered
    }

    /// Whether a connection is currently a member of a room.
    pub fn is_member(&self, room: &Room, connection_id: &Uuid) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.iter().any(|m| m.connection_id == *connection_id))
    }

    /// Number of members currently in a room.
    pub fn room_size(&self, room: &Room) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }

    /// Number of connections present in at least one room.
    pub fn connection_count(&self) -> usize {
        self.memberships.len()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("connections", &self.memberships.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event() -> ServerEvent {
        ServerEvent::error("test")
    }

    #[tokio::test]
    async fn join_and_broadcast() {
        let registry = RoomRegistry::new();
        let room = Room::Chat(Uuid::now_v7());

        let conn_a = Uuid::now_v7();
        let (tx_a, mut rx_a) = RoomRegistry::open_mailbox();
        let conn_b = Uuid::now_v7();
        let (tx_b, mut rx_b) = RoomRegistry::open_mailbox();

        assert!(registry.join(room, conn_a, tx_a));
        assert!(registry.join(room, conn_b, tx_b));

        let delivered = registry.broadcast(&room, &test_event());
        assert_eq!(delivered, 2);
        assert!(matches!(rx_a.recv().await, Some(ServerEvent::Error { .. })));
        assert!(matches!(rx_b.recv().await, Some(ServerEvent::Error { .. })));
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        let room = Room::User(Uuid::now_v7());
        let conn = Uuid::now_v7();
        let (tx, mut rx) = RoomRegistry::open_mailbox();

        assert!(registry.join(room, conn, tx.clone()));
        assert!(!registry.join(room, conn, tx));
        assert_eq!(registry.room_size(&room), 1);

        let delivered = registry.broadcast(&room, &test_event());
        assert_eq!(delivered, 1);
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_stops_delivery() {
        let registry = RoomRegistry::new();
        let room = Room::Chat(Uuid::now_v7());
        let conn = Uuid::now_v7();
        let (tx, _rx) = RoomRegistry::open_mailbox();

        registry.join(room, conn, tx);
        assert!(registry.leave(&room, &conn));
        assert!(!registry.leave(&room, &conn));

        assert_eq!(registry.broadcast(&room, &test_event()), 0);
        assert_eq!(registry.room_size(&room), 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let room_a = Room::Chat(Uuid::now_v7());
        let room_b = Room::Chat(Uuid::now_v7());

        let conn = Uuid::now_v7();
        let (tx, mut rx) = RoomRegistry::open_mailbox();
        registry.join(room_a, conn, tx);

        assert_eq!(registry.broadcast(&room_b, &test_event()), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn multi_device_user_room() {
        let registry = RoomRegistry::new();
        let room = Room::User(Uuid::now_v7());

        let (tx_phone, mut rx_phone) = RoomRegistry::open_mailbox();
        let (tx_laptop, mut rx_laptop) = RoomRegistry::open_mailbox();
        registry.join(room, Uuid::now_v7(), tx_phone);
        registry.join(room, Uuid::now_v7(), tx_laptop);

        assert_eq!(registry.broadcast(&room, &test_event()), 2);
        assert!(rx_phone.recv().await.is_some());
        assert!(rx_laptop.recv().await.is_some());
    }

    #[tokio::test]
    async fn drop_connection_leaves_every_room() {
        let registry = RoomRegistry::new();
        let user_room = Room::User(Uuid::now_v7());
        let chat_room = Room::Chat(Uuid::now_v7());
        let conn = Uuid::now_v7();
        let (tx, _rx) = RoomRegistry::open_mailbox();

        registry.join(user_room, conn, tx.clone());
        registry.join(chat_room, conn, tx);
        assert_eq!(registry.connection_count(), 1);

        registry.drop_connection(&conn);
        assert_eq!(registry.room_size(&user_room), 0);
        assert_eq!(registry.room_size(&chat_room), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_evicts_closed_connections() {
        let registry = RoomRegistry::new();
        let room = Room::Chat(Uuid::now_v7());
        let conn = Uuid::now_v7();
        let (tx, rx) = RoomRegistry::open_mailbox();

        registry.join(room, conn, tx);
        drop(rx);

        assert_eq!(registry.broadcast(&room, &test_event()), 0);
        assert!(!registry.is_member(&room, &conn));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn debug_impl() {
        let registry = RoomRegistry::new();
        let debug = format!("{registry:?}");
        assert!(debug.contains("RoomRegistry"));
        assert!(debug.contains("rooms"));
    }
}
