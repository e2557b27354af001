//! Account registration and token authentication.

use std::sync::Arc;

use chatdocs_types::error::{RepositoryError, UserError};
use chatdocs_types::user::{
    LoginRequest, NewUser, RegisterUserRequest, Role, User, UserId, parse_roles,
};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::repository::token::AccessTokenRepository;
use crate::repository::user::UserRepository;
use crate::service::credentials::CredentialHasher;

/// A freshly issued access token. The plaintext is only available here.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

/// Lifetime of an access token when none is configured.
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 10;

pub struct UserService<U, T, H> {
    users: Arc<U>,
    tokens: Arc<T>,
    hasher: Arc<H>,
    token_ttl: Duration,
}

impl<U, T, H> UserService<U, T, H>
where
    U: UserRepository,
    T: AccessTokenRepository,
    H: CredentialHasher,
{
    pub fn new(users: Arc<U>, tokens: Arc<T>, hasher: Arc<H>) -> Self {
        Self {
            users,
            tokens,
            hasher,
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES as i64),
        }
    }

    /// Tokens older than `minutes` no longer authenticate.
    pub fn with_token_ttl_minutes(mut self, minutes: u64) -> Self {
        let max_minutes = (i64::MAX / 60_000) as u64;
        self.token_ttl = Duration::minutes(minutes.min(max_minutes) as i64);
        self
    }

    /// Earliest issue time a token may have and still be valid.
    fn token_cutoff(&self) -> chrono::DateTime<Utc> {
        Utc::now()
            .checked_sub_signed(self.token_ttl)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC)
    }

    /// Register an account. `request.role` is parsed with [`parse_roles`].
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, UserError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(UserError::Validation("username cannot be empty".to_string()));
        }
        let email = normalize_email(&request.email);
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(UserError::Validation(format!("invalid email '{email}'")));
        }
        if request.password.is_empty() {
            return Err(UserError::Validation("password cannot be empty".to_string()));
        }
        let roles = parse_roles(request.role.as_deref().unwrap_or(""))?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken(email));
        }

        let new_user = NewUser {
            username: username.to_string(),
            email: email.clone(),
            password_hash: self.hasher.hash_password(&request.password)?,
            roles,
        };
        let user = self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::EmailTaken(email),
            other => UserError::Record(other),
        })?;
        info!(user_id = %user.id, roles = ?user.roles, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a new access token.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedToken, UserError> {
        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;
        if !self
            .hasher
            .verify_password(&request.password, &user.password_hash)
        {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(UserError::InvalidCredentials);
        }

        match self.tokens.purge_issued_before(self.token_cutoff()).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "Expired access tokens removed"),
            Err(e) => warn!(error = %e, "Failed to purge expired access tokens"),
        }

        let token = self.hasher.new_access_token();
        self.tokens
            .insert(user.id, &self.hasher.hash_access_token(&token))
            .await?;
        info!(user_id = %user.id, "Access token issued");
        Ok(IssuedToken { token, user })
    }

    /// Resolve a bearer token to its user. Expired tokens are rejected.
    pub async fn authenticate(&self, token: &str) -> Result<User, UserError> {
        let digest = self.hasher.hash_access_token(token);
        let user_id = self
            .tokens
            .resolve(&digest, self.token_cutoff())
            .await?
            .ok_or(UserError::InvalidCredentials)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::InvalidCredentials)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.users.list().await?)
    }

    pub async fn find_user(&self, id: UserId) -> Result<User, UserError> {
        self.users.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Revoke every token of a user (logout everywhere).
    pub async fn revoke_tokens(&self, id: UserId) -> Result<u64, UserError> {
        Ok(self.tokens.revoke_all(id).await?)
    }

    /// Create the bootstrap administrator unless the email is already taken.
    /// Returns the new account, or `None` when it already existed.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        if let Some(existing) = self.users.find_by_email(&normalize_email(email)).await? {
            info!(user_id = %existing.id, "Bootstrap admin already exists, skipping");
            return Ok(None);
        }
        let user = self
            .register(RegisterUserRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: Some(Role::Admin.to_string()),
            })
            .await?;
        Ok(Some(user))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
