//! User repository trait definition.

use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::{NewUser, User, UserId};

/// Repository trait for user accounts.
pub trait UserRepository: Send + Sync {
    /// Insert a user. `Conflict` when the email is already registered.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn list(&self) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Delete a user. Fails while chatbots still reference it.
    fn delete(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
