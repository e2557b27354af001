//! SQLite chatbot repository implementation.
//!
//! Implements `ChatbotRepository` from `chatdocs-core` using sqlx with split read/write pools.

use chatdocs_core::repository::chatbot::ChatbotRepository;
use chatdocs_types::chatbot::{Chatbot, ChatbotId};
use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::UserId;
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx, parse_datetime};

/// SQLite-backed implementation of `ChatbotRepository`.
pub struct SqliteChatbotRepository {
    pool: DatabasePool,
}

impl SqliteChatbotRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Chatbot.
struct ChatbotRow {
    id: i64,
    name: String,
    user_id: i64,
    created_at: String,
    updated_at: String,
}

impl ChatbotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chatbot(self) -> Result<Chatbot, RepositoryError> {
        Ok(Chatbot {
            id: ChatbotId(self.id),
            name: self.name,
            owner_id: UserId(self.user_id),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn chatbot_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Chatbot, RepositoryError> {
    ChatbotRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_chatbot()
}

impl ChatbotRepository for SqliteChatbotRepository {
    async fn create(&self, name: &str, owner_id: UserId) -> Result<Chatbot, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO chatbots (name, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(owner_id.0)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) => Ok(Chatbot {
                id: ChatbotId(done.last_insert_rowid()),
                name: name.to_string(),
                owner_id,
                created_at: now,
                updated_at: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => Err(
                RepositoryError::Query(format!("owner {owner_id} does not exist")),
            ),
            Err(e) => Err(map_sqlx(e)),
        }
    }

    async fn find_by_id(&self, id: ChatbotId) -> Result<Option<Chatbot>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chatbots WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(chatbot_from_row).transpose()
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Chatbot>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chatbots WHERE user_id = ? ORDER BY id")
            .bind(owner_id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(chatbot_from_row).collect()
    }

    async fn list_ids_by_owner(&self, owner_id: UserId) -> Result<Vec<ChatbotId>, RepositoryError> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM chatbots WHERE user_id = ? ORDER BY id")
            .bind(owner_id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        Ok(ids.into_iter().map(|(id,)| ChatbotId(id)).collect())
    }

    async fn delete(&self, id: ChatbotId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chatbots WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
