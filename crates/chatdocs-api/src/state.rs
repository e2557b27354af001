//! Application state wiring all services together.
//!
//! The orchestrators are generic over the core port traits; `AppState` pins
//! them to SQLite, S3 and the HTTP processing client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chatdocs_core::service::chatbot::ChatbotQueries;
use chatdocs_core::service::creation::CreationOrchestrator;
use chatdocs_core::service::deletion::DeletionOrchestrator;
use chatdocs_core::service::user::UserService;
use chatdocs_core::service::user_deletion::UserDeletionOrchestrator;
use chatdocs_infra::crypto::credentials::Argon2CredentialHasher;
use chatdocs_infra::processing::{HttpProcessingClient, ProcessingProxy};
use chatdocs_infra::s3::S3ObjectStore;
use chatdocs_infra::sqlite::chatbot::SqliteChatbotRepository;
use chatdocs_infra::sqlite::pool::{DatabasePool, default_database_url};
use chatdocs_infra::sqlite::token::SqliteAccessTokenRepository;
use chatdocs_infra::sqlite::user::SqliteUserRepository;
use chatdocs_types::config::GatewayConfig;

pub type ConcreteCreation =
    CreationOrchestrator<SqliteChatbotRepository, S3ObjectStore, HttpProcessingClient>;

pub type ConcreteDeletion =
    DeletionOrchestrator<SqliteChatbotRepository, S3ObjectStore, HttpProcessingClient>;

pub type ConcreteUserDeletion = UserDeletionOrchestrator<
    SqliteUserRepository,
    SqliteChatbotRepository,
    S3ObjectStore,
    HttpProcessingClient,
>;

pub type ConcreteUserService =
    UserService<SqliteUserRepository, SqliteAccessTokenRepository, Argon2CredentialHasher>;

/// Shared state for CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub creation: Arc<ConcreteCreation>,
    pub deletion: Arc<ConcreteDeletion>,
    pub user_deletion: Arc<ConcreteUserDeletion>,
    pub users: Arc<ConcreteUserService>,
    pub chatbots: Arc<ChatbotQueries<SqliteChatbotRepository>>,
    pub objects: Arc<S3ObjectStore>,
    pub proxy: Arc<ProcessingProxy>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Connect to the database, object store and processing service.
    pub async fn init(config: GatewayConfig, data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let db_url = config
            .database_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| default_database_url(data_dir));
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("opening database {db_url}"))?;

        let objects = S3ObjectStore::from_config(&config.storage).await?;
        let timeout = Duration::from_secs(config.processing.timeout_secs);
        let processing = HttpProcessingClient::new(&config.processing.base_url, timeout)?;
        let proxy = ProcessingProxy::new(&config.processing.base_url, timeout)?;

        tracing::info!(
            bucket = objects.bucket(),
            region = %objects.region(),
            processing = processing.base_url(),
            "Gateway dependencies configured"
        );

        Ok(Self::assemble(config, db_pool, objects, processing, proxy))
    }

    /// Wire services around already-constructed infrastructure.
    pub fn assemble(
        config: GatewayConfig,
        db_pool: DatabasePool,
        objects: S3ObjectStore,
        processing: HttpProcessingClient,
        proxy: ProcessingProxy,
    ) -> Self {
        let chatbot_repo = Arc::new(SqliteChatbotRepository::new(db_pool.clone()));
        let user_repo = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let token_repo = Arc::new(SqliteAccessTokenRepository::new(db_pool));
        let objects = Arc::new(objects);
        let processing = Arc::new(processing);

        Self {
            creation: Arc::new(CreationOrchestrator::new(
                chatbot_repo.clone(),
                objects.clone(),
                processing.clone(),
            )),
            deletion: Arc::new(DeletionOrchestrator::new(
                chatbot_repo.clone(),
                objects.clone(),
                processing.clone(),
            )),
            user_deletion: Arc::new(UserDeletionOrchestrator::new(
                user_repo.clone(),
                chatbot_repo.clone(),
                objects.clone(),
                processing,
            )),
            users: Arc::new(
                UserService::new(
                    user_repo,
                    token_repo,
                    Arc::new(Argon2CredentialHasher::new()),
                )
                .with_token_ttl_minutes(config.auth.token_ttl_minutes),
            ),
            chatbots: Arc::new(ChatbotQueries::new(chatbot_repo)),
            objects,
            proxy: Arc::new(proxy),
            config: Arc::new(config),
        }
    }

    /// Create the configured bootstrap administrator, if any.
    pub async fn bootstrap_admin(&self) -> anyhow::Result<()> {
        let admin = &self.config.admin;
        let Some((email, password)) = admin.credentials() else {
            return Ok(());
        };
        let username = admin.username.as_deref().unwrap_or("admin");
        if let Some(user) = self.users.ensure_admin(username, email, password).await? {
            tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chatdocs_types::config::StorageConfig;

    /// State backed by a temp SQLite database. The object store and
    /// processing service point at a closed port, so any request that
    /// reaches them fails.
    pub(crate) async fn test_state() -> AppState {
        test_state_with_processing("http://127.0.0.1:9").await
    }

    /// Like [`test_state`], with the processing service at `processing_url`.
    pub(crate) async fn test_state_with_processing(processing_url: &str) -> AppState {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        let pool = DatabasePool::new(&url).await.unwrap();
        std::mem::forget(dir);

        let storage = StorageConfig {
            bucket: "chatdocs-test".to_string(),
            endpoint_url: Some("http://127.0.0.1:9".to_string()),
            force_path_style: true,
            access_key_id: Some("test".to_string()),
            secret_access_key: Some("test".into()),
            ..StorageConfig::default()
        };
        let objects = S3ObjectStore::from_config(&storage).await.unwrap();
        let processing =
            HttpProcessingClient::new(processing_url, Duration::from_secs(1)).unwrap();
        let proxy = ProcessingProxy::new(processing_url, Duration::from_secs(1)).unwrap();

        AppState::assemble(GatewayConfig::default(), pool, objects, processing, proxy)
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let mut state = test_state().await;
        let mut config = GatewayConfig::default();
        config.admin.email = Some("root@example.com".to_string());
        config.admin.password = Some("secret".into());
        state.config = Arc::new(config);

        state.bootstrap_admin().await.unwrap();
        state.bootstrap_admin().await.unwrap();

        let users = state.users.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
    }
}
