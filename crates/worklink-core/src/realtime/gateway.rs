//! The realtime gateway: per-connection sessions and event dispatch.
//!
//! One `ClientSession` exists per socket connection. The gateway routes
//! each inbound `ClientEvent` to the chat service or the room registry
//! and decides what the acting connection hears back: operational
//! failures become `error` events on that connection only, while
//! missing-target reads and denied joins stay silent. No event here is
//! ever fatal to the process, and one connection's failure never
//! touches another's session.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use worklink_types::error::ChatError;
use worklink_types::realtime::{ClientEvent, Room, ServerEvent};

use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::realtime::access::ChatAccess;
use crate::realtime::registry::RoomRegistry;

/// Per-connection state held by the socket task.
///
/// `user_id` is set by the first `join` and gates conversation-room
/// joins; until then the connection can only listen.
#[derive(Debug)]
pub struct ClientSession {
    pub connection_id: Uuid,
    user_id: Option<Uuid>,
    sender: mpsc::Sender<ServerEvent>,
}

impl ClientSession {
    /// Queue an event for this connection, dropping it if the
    /// connection is gone or hopelessly backed up.
    fn push(&self, event: ServerEvent) {
        if self.sender.try_send(event).is_err() {
            debug!(connection_id = %self.connection_id, "dropped event for closed or saturated connection");
        }
    }
}

/// Routes socket events between connections, the chat service, and the
/// room registry.
///
/// The registry is injected rather than ambient so tests (and future
/// alternate transports) can assemble a gateway from parts.
pub struct ChatGateway<R: ChatRepository, A: ChatAccess> {
    service: Arc<ChatService<R>>,
    access: Arc<A>,
    registry: Arc<RoomRegistry>,
}

impl<R: ChatRepository, A: ChatAccess> ChatGateway<R, A> {
    pub fn new(service: Arc<ChatService<R>>, access: Arc<A>, registry: Arc<RoomRegistry>) -> Self {
        Self {
            service,
            access,
            registry,
        }
    }

    /// Open a session for a freshly accepted connection.
    ///
    /// Returns the session handle plus the receiver half of its
    /// outbound mailbox; the socket task pumps that receiver into the
    /// wire.
    pub fn connect(&self) -> (ClientSession, mpsc::Receiver<ServerEvent>) {
        let (sender, receiver) = RoomRegistry::open_mailbox();
        let session = ClientSession {
            connection_id: Uuid::now_v7(),
            user_id: None,
            sender,
        };
        debug!(connection_id = %session.connection_id, "connection opened");
        (session, receiver)
    }

    /// Handle one inbound event to completion.
    pub async fn handle_event(&self, session: &mut ClientSession, event: ClientEvent) {
        match event {
            ClientEvent::Join { user_id } => self.handle_join(session, user_id),
            ClientEvent::JoinChat { chat_id } => self.handle_join_chat(session, chat_id).await,
            ClientEvent::LeaveChat { chat_id } => {
                self.registry
                    .leave(&Room::Chat(chat_id), &session.connection_id);
            }
            ClientEvent::SendMessage {
                chat_id,
                sender_id,
                content,
            } => self.handle_send(session, chat_id, sender_id, &content).await,
            ClientEvent::ServiceUpdate {
                service_id,
                user_id,
                status,
            } => {
                self.service.service_update(service_id, user_id, status);
            }
            ClientEvent::MarkAsRead {
                chat_id,
                message_id,
            } => self.handle_mark_as_read(session, chat_id, message_id).await,
        }
    }

    /// Tear down a session after its socket closes.
    ///
    /// Purely in-memory: every room membership goes away, nothing
    /// durable changes.
    pub fn disconnect(&self, session: &ClientSession) {
        self.registry.drop_connection(&session.connection_id);
        debug!(connection_id = %session.connection_id, "connection closed");
    }

    fn handle_join(&self, session: &mut ClientSession, user_id: Uuid) {
        session.user_id = Some(user_id);
        self.registry.join(
            Room::User(user_id),
            session.connection_id,
            session.sender.clone(),
        );
        info!(connection_id = %session.connection_id, %user_id, "connection identified");
    }

    async fn handle_join_chat(&self, session: &mut ClientSession, chat_id: Uuid) {
        let Some(user_id) = session.user_id else {
            debug!(connection_id = %session.connection_id, %chat_id, "join_chat before join ignored");
            return;
        };
        match self.access.can_join_chat(&user_id, &chat_id).await {
            Ok(true) => {
                self.registry.join(
                    Room::Chat(chat_id),
                    session.connection_id,
                    session.sender.clone(),
                );
            }
            // Silent on denial so probing cannot distinguish a chat
            // that does not exist from one that is not yours.
            Ok(false) => {
                debug!(%user_id, %chat_id, "join_chat denied");
            }
            Err(err) => {
                warn!(%user_id, %chat_id, error = %err, "join_chat authorization lookup failed");
                session.push(ServerEvent::error("unable to join chat right now"));
            }
        }
    }

    async fn handle_send(
        &self,
        session: &mut ClientSession,
        chat_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) {
        if let Err(err) = self.service.send_message(chat_id, sender_id, content).await {
            let reply = match &err {
                ChatError::Persistence(_) => {
                    error!(%chat_id, %sender_id, error = %err, "send_message persistence failure");
                    "message could not be saved".to_string()
                }
                other => {
                    warn!(%chat_id, %sender_id, error = %other, "send_message rejected");
                    other.to_string()
                }
            };
            session.push(ServerEvent::error(reply));
        }
    }

    async fn handle_mark_as_read(
        &self,
        session: &mut ClientSession,
        chat_id: Uuid,
        message_id: Uuid,
    ) {
        match self.service.mark_as_read(chat_id, message_id).await {
            Ok(_) => {}
            Err(ChatError::MessageNotFound) | Err(ChatError::ChatNotFound) => {
                debug!(%chat_id, %message_id, "mark_as_read on missing message ignored");
            }
            Err(err) => {
                error!(%chat_id, %message_id, error = %err, "mark_as_read failed");
                session.push(ServerEvent::error("read state could not be saved"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::InMemoryChatRepository;
    use crate::realtime::access::ParticipantAccess;
    use worklink_types::realtime::NotificationKind;
    use worklink_types::service::ServiceStatus;

    type TestGateway = ChatGateway<InMemoryChatRepository, ParticipantAccess<InMemoryChatRepository>>;

    fn make_gateway() -> (Arc<InMemoryChatRepository>, Arc<RoomRegistry>, TestGateway) {
        let repo = Arc::new(InMemoryChatRepository::new());
        let registry = Arc::new(RoomRegistry::new());
        let service = Arc::new(ChatService::new(repo.clone(), registry.clone(), 4_000));
        let access = Arc::new(ParticipantAccess::new(repo.clone()));
        let gateway = ChatGateway::new(service, access, registry.clone());
        (repo, registry, gateway)
    }

    async fn connect_as(
        gateway: &TestGateway,
        user_id: Uuid,
    ) -> (ClientSession, mpsc::Receiver<ServerEvent>) {
        let (mut session, rx) = gateway.connect();
        gateway
            .handle_event(&mut session, ClientEvent::Join { user_id })
            .await;
        (session, rx)
    }

    async fn create_chat(gateway: &TestGateway, participants: Vec<Uuid>) -> Uuid {
        gateway
            .service
            .create_chat(participants, None)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn two_users_exchange_messages() {
        let (_repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, mut rx_a) = connect_as(&gateway, alice).await;
        let (mut b, mut rx_b) = connect_as(&gateway, bob).await;
        gateway
            .handle_event(&mut a, ClientEvent::JoinChat { chat_id })
            .await;
        gateway
            .handle_event(&mut b, ClientEvent::JoinChat { chat_id })
            .await;

        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: "Hello".to_string(),
                },
            )
            .await;

        // Bob sees the message in the room, then the inbox notification.
        match rx_b.recv().await.unwrap() {
            ServerEvent::NewMessage { message } => assert_eq!(message.content, "Hello"),
            other => panic!("expected new_message, got {other:?}"),
        }
        match rx_b.recv().await.unwrap() {
            ServerEvent::Notification { kind, content, .. } => {
                assert_eq!(kind, NotificationKind::NewMessage);
                assert_eq!(content, "Hello");
            }
            other => panic!("expected notification, got {other:?}"),
        }

        // Alice sees her own message echoed in the room, no notification.
        match rx_a.recv().await.unwrap() {
            ServerEvent::NewMessage { message } => assert_eq!(message.sender_id, alice),
            other => panic!("expected new_message, got {other:?}"),
        }
        assert!(rx_a.try_recv().is_err());

        // Bob replies; Alice sees it live plus the inbox notification.
        gateway
            .handle_event(
                &mut b,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: bob,
                    content: "Hi back".to_string(),
                },
            )
            .await;
        match rx_a.recv().await.unwrap() {
            ServerEvent::NewMessage { message } => assert_eq!(message.content, "Hi back"),
            other => panic!("expected new_message, got {other:?}"),
        }
        match rx_a.recv().await.unwrap() {
            ServerEvent::Notification { sender_id, .. } => assert_eq!(sender_id, bob),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn long_message_notification_is_truncated() {
        let (_repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, _rx_a) = connect_as(&gateway, alice).await;
        let (_b, mut rx_b) = connect_as(&gateway, bob).await;

        let long = "x".repeat(80);
        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: long,
                },
            )
            .await;

        match rx_b.recv().await.unwrap() {
            ServerEvent::Notification { content, .. } => {
                assert_eq!(content.chars().count(), 51);
                assert!(content.ends_with('…'));
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_receipt_reaches_sender_exactly_once() {
        let (repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, mut rx_a) = connect_as(&gateway, alice).await;
        let (mut b, mut rx_b) = connect_as(&gateway, bob).await;
        gateway
            .handle_event(&mut b, ClientEvent::JoinChat { chat_id })
            .await;

        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: "read me".to_string(),
                },
            )
            .await;
        let message_id = match rx_b.recv().await.unwrap() {
            ServerEvent::NewMessage { message } => message.id,
            other => panic!("expected new_message, got {other:?}"),
        };
        assert!(matches!(
            rx_b.recv().await.unwrap(),
            ServerEvent::Notification { .. }
        ));

        gateway
            .handle_event(
                &mut b,
                ClientEvent::MarkAsRead {
                    chat_id,
                    message_id,
                },
            )
            .await;
        match rx_a.recv().await.unwrap() {
            ServerEvent::MessageRead {
                chat_id: c,
                message_id: m,
                ..
            } => {
                assert_eq!(c, chat_id);
                assert_eq!(m, message_id);
            }
            other => panic!("expected message_read, got {other:?}"),
        }

        // Marking again transitions nothing and emits nothing.
        gateway
            .handle_event(
                &mut b,
                ClientEvent::MarkAsRead {
                    chat_id,
                    message_id,
                },
            )
            .await;
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());

        let stored = repo.get_message(&chat_id, &message_id).await.unwrap().unwrap();
        assert!(stored.read);
        assert!(stored.read_at.is_some());
    }

    #[tokio::test]
    async fn send_to_unknown_chat_errors_sender_only() {
        let (_repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        // A real chat exists, but the send targets a different id.
        let _real = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, mut rx_a) = connect_as(&gateway, alice).await;
        let (_b, mut rx_b) = connect_as(&gateway, bob).await;

        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id: Uuid::now_v7(),
                    sender_id: alice,
                    content: "into the void".to_string(),
                },
            )
            .await;

        match rx_a.recv().await.unwrap() {
            ServerEvent::Error { message } => assert!(message.contains("chat not found")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_chat_requires_prior_join() {
        let (_repo, registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice]).await;

        let (mut session, mut rx) = gateway.connect();
        gateway
            .handle_event(&mut session, ClientEvent::JoinChat { chat_id })
            .await;

        assert!(!registry.is_member(&Room::Chat(chat_id), &session.connection_id));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_chat_denied_for_non_participant() {
        let (_repo, registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice]).await;

        let (mut s, mut rx_s) = connect_as(&gateway, stranger).await;
        gateway
            .handle_event(&mut s, ClientEvent::JoinChat { chat_id })
            .await;

        assert!(!registry.is_member(&Room::Chat(chat_id), &s.connection_id));
        // Denial is silent.
        assert!(rx_s.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_chat_stops_room_delivery() {
        let (_repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, _rx_a) = connect_as(&gateway, alice).await;
        let (mut b, mut rx_b) = connect_as(&gateway, bob).await;
        gateway
            .handle_event(&mut b, ClientEvent::JoinChat { chat_id })
            .await;
        gateway
            .handle_event(&mut b, ClientEvent::LeaveChat { chat_id })
            .await;

        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: "gone already".to_string(),
                },
            )
            .await;

        // Only the inbox notification arrives, not the room broadcast.
        match rx_b.recv().await.unwrap() {
            ServerEvent::Notification { .. } => {}
            other => panic!("expected notification, got {other:?}"),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn multi_device_inbox_delivery() {
        let (_repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, _rx_a) = connect_as(&gateway, alice).await;
        let (_phone, mut rx_phone) = connect_as(&gateway, bob).await;
        let (_laptop, mut rx_laptop) = connect_as(&gateway, bob).await;

        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: "ping".to_string(),
                },
            )
            .await;

        assert!(matches!(
            rx_phone.recv().await.unwrap(),
            ServerEvent::Notification { .. }
        ));
        assert!(matches!(
            rx_laptop.recv().await.unwrap(),
            ServerEvent::Notification { .. }
        ));
    }

    #[tokio::test]
    async fn service_update_routed_to_inbox() {
        let (_repo, _registry, gateway) = make_gateway();
        let client = Uuid::now_v7();
        let professional = Uuid::now_v7();

        let (_c, mut rx_c) = connect_as(&gateway, client).await;
        let (mut p, _rx_p) = connect_as(&gateway, professional).await;

        gateway
            .handle_event(
                &mut p,
                ClientEvent::ServiceUpdate {
                    service_id: Uuid::now_v7(),
                    user_id: client,
                    status: ServiceStatus::InProgress,
                },
            )
            .await;

        match rx_c.recv().await.unwrap() {
            ServerEvent::ServiceNotification { kind, status, .. } => {
                assert_eq!(kind, NotificationKind::StatusUpdate);
                assert_eq!(status, ServiceStatus::InProgress);
            }
            other => panic!("expected service_notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persistence_failure_reported_to_acting_connection() {
        let (repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice, bob]).await;

        let (mut a, mut rx_a) = connect_as(&gateway, alice).await;
        let (_b, mut rx_b) = connect_as(&gateway, bob).await;

        repo.fail_appends(true);
        gateway
            .handle_event(
                &mut a,
                ClientEvent::SendMessage {
                    chat_id,
                    sender_id: alice,
                    content: "doomed".to_string(),
                },
            )
            .await;

        match rx_a.recv().await.unwrap() {
            ServerEvent::Error { message } => {
                assert_eq!(message, "message could not be saved");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_clears_memberships() {
        let (_repo, registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice]).await;

        let (mut a, _rx_a) = connect_as(&gateway, alice).await;
        gateway
            .handle_event(&mut a, ClientEvent::JoinChat { chat_id })
            .await;
        assert_eq!(registry.connection_count(), 1);

        gateway.disconnect(&a);
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.room_size(&Room::User(alice)), 0);
        assert_eq!(registry.room_size(&Room::Chat(chat_id)), 0);
    }

    #[tokio::test]
    async fn participant_access_policy() {
        let (repo, _registry, gateway) = make_gateway();
        let alice = Uuid::now_v7();
        let chat_id = create_chat(&gateway, vec![alice]).await;
        let access = ParticipantAccess::new(repo);

        assert!(access.can_join_chat(&alice, &chat_id).await.unwrap());
        assert!(!access.can_join_chat(&Uuid::now_v7(), &chat_id).await.unwrap());
        assert!(!access.can_join_chat(&alice, &Uuid::now_v7()).await.unwrap());
    }
}
