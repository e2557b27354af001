//! SQLite access token repository implementation.

use chatdocs_core::repository::token::AccessTokenRepository;
use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::UserId;
use chrono::{DateTime, Utc};

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx};

pub struct SqliteAccessTokenRepository {
    pool: DatabasePool,
}

impl SqliteAccessTokenRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl AccessTokenRepository for SqliteAccessTokenRepository {
    async fn insert(&self, user_id: UserId, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO access_tokens (token_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(user_id.0)
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn resolve(
        &self,
        token_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<UserId>, RepositoryError> {
        // julianday() compares instants; the stored text varies in precision.
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM access_tokens \
             WHERE token_hash = ? AND julianday(created_at) >= julianday(?)",
        )
        .bind(token_hash)
        .bind(format_datetime(&issued_after))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx)?;

        let Some((user_id,)) = row else {
            return Ok(None);
        };

        // Best-effort usage tracking; a failed touch does not fail the lookup.
        if let Err(e) = sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE token_hash = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(token_hash)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "Failed to update token last_used_at");
        }

        Ok(Some(UserId(user_id)))
    }

    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM access_tokens WHERE julianday(created_at) < julianday(?)")
                .bind(format_datetime(&cutoff))
                .execute(&self.pool.writer)
                .await
                .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn revoke_all(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }
}
