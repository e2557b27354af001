//! Chatbot repository trait definition.

use chatdocs_types::chatbot::{Chatbot, ChatbotId};
use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::UserId;

/// Repository trait for chatbot records.
///
/// Implementations live in chatdocs-infra (e.g., SqliteChatbotRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ChatbotRepository: Send + Sync {
    /// Insert a new record. The store assigns the id and timestamps.
    fn create(
        &self,
        name: &str,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<Chatbot, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: ChatbotId,
    ) -> impl std::future::Future<Output = Result<Option<Chatbot>, RepositoryError>> + Send;

    /// All chatbots of one owner, oldest first.
    fn find_by_owner(
        &self,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Chatbot>, RepositoryError>> + Send;

    /// Ids of all chatbots of one owner, ascending.
    fn list_ids_by_owner(
        &self,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatbotId>, RepositoryError>> + Send;

    /// Permanently delete a record. `NotFound` if it does not exist.
    fn delete(
        &self,
        id: ChatbotId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
