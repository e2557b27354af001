//! Bearer token authentication.
//!
//! `Authorization: Bearer <token>` is resolved through the access-token
//! table (SHA-256 digest lookup) to the calling user. The resolved user id
//! is the only identity the orchestrators ever see.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chatdocs_types::error::UserError;
use chatdocs_types::user::{Role, UserId};

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.users.authenticate(&token).await.map_err(|e| match e {
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid or expired access token".to_string())
            }
            other => AppError::User(other),
        })?;
        Ok(Caller {
            user_id: user.id,
            username: user.username,
            roles: user.roles,
        })
    }
}

/// A caller holding the `ADMIN` role. Anyone else gets 403.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Administrator role required".to_string()));
        }
        Ok(RequireAdmin(caller))
    }
}

fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing access token. Provide 'Authorization: Bearer <token>'.".to_string(),
            )
        })?;
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}
