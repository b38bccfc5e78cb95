//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and the
//! HTTP/WebSocket layer. Services are generic over the repository and access
//! traits, but AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use worklink_core::chat::service::ChatService;
use worklink_core::realtime::access::ParticipantAccess;
use worklink_core::realtime::gateway::ChatGateway;
use worklink_core::realtime::registry::RoomRegistry;
use worklink_infra::config::load_global_config;
use worklink_infra::sqlite::chat::SqliteChatRepository;
use worklink_infra::sqlite::pool::{DatabasePool, resolve_data_dir};
use worklink_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

pub type ConcreteGateway =
    ChatGateway<SqliteChatRepository, ParticipantAccess<SqliteChatRepository>>;

/// Shared application state holding all services.
///
/// Used by CLI commands, REST handlers, and the WebSocket gateway.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub gateway: Arc<ConcreteGateway>,
    pub registry: Arc<RoomRegistry>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_with_data_dir(resolve_data_dir()).await
    }

    /// Initialize against an explicit data directory.
    pub async fn init_with_data_dir(data_dir: PathBuf) -> anyhow::Result<Self> {
        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("worklink.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_global_config(&data_dir).await;

        // One registry instance is shared by the service (for fan-out) and
        // the gateway (for room membership).
        let registry = Arc::new(RoomRegistry::default());

        let chat_repo = Arc::new(SqliteChatRepository::new(db_pool.clone()));
        let chat_service = Arc::new(ChatService::new(
            chat_repo.clone(),
            registry.clone(),
            config.max_message_chars,
        ));

        let access = Arc::new(ParticipantAccess::new(chat_repo));
        let gateway = Arc::new(ChatGateway::new(
            chat_service.clone(),
            access,
            registry.clone(),
        ));

        Ok(Self {
            chat_service,
            gateway,
            registry,
            config,
            data_dir,
            db_pool,
        })
    }
}
