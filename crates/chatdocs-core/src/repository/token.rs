//! Access token repository trait definition.
//!
//! Only digests of tokens are stored; the plaintext is shown to the caller
//! once at login.

use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::UserId;
use chrono::{DateTime, Utc};

pub trait AccessTokenRepository: Send + Sync {
    /// Record a token digest for `user_id`.
    fn insert(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Resolve a token digest to its user, touching `last_used_at`.
    /// Tokens issued before `issued_after` resolve to `None`.
    fn resolve(
        &self,
        token_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, RepositoryError>> + Send;

    /// Delete tokens issued before `cutoff`. Returns how many were removed.
    fn purge_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Revoke every token of a user. Returns how many were removed.
    fn revoke_all(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
