//! SQLite user repository implementation.

use chatdocs_core::repository::user::UserRepository;
use chatdocs_types::error::RepositoryError;
use chatdocs_types::user::{NewUser, User, UserId, format_roles, parse_roles};
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let get = |e: sqlx::Error| RepositoryError::Query(e.to_string());
    let roles: String = row.try_get("roles").map_err(get)?;
    let created_at: String = row.try_get("created_at").map_err(get)?;
    Ok(User {
        id: UserId(row.try_get("id").map_err(get)?),
        username: row.try_get("username").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        password_hash: row.try_get("password_hash").map_err(get)?,
        roles: parse_roles(&roles).map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, roles, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(format_roles(&user.roles))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: UserId(done.last_insert_rowid()),
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                roles: user.roles.clone(),
                created_at: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("email '{}' already exists", user.email)),
            ),
            Err(e) => Err(map_sqlx(e)),
        }
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => Err(
                RepositoryError::Conflict(format!("user {id} still owns chatbots")),
            ),
            Err(e) => Err(map_sqlx(e)),
        }
    }
}
