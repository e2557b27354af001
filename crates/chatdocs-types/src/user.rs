use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::chatbot::ChatbotId;
use crate::error::UserError;

/// Database-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Authorization roles. Holding any role implies holding `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// Parse a whitespace-separated role string ("ADMIN", "user admin", "").
///
/// Case-insensitive. An empty string means `USER`. `ADMIN` always brings
/// `USER` with it, and duplicates are collapsed while keeping first-seen order.
///
/// ```
/// use chatdocs_types::user::{parse_roles, Role};
///
/// assert_eq!(parse_roles("").unwrap(), vec![Role::User]);
/// assert_eq!(parse_roles("admin").unwrap(), vec![Role::Admin, Role::User]);
/// ```
pub fn parse_roles(input: &str) -> Result<Vec<Role>, UserError> {
    let mut roles = Vec::new();
    for token in input.split_whitespace() {
        let role: Role = token.parse().map_err(UserError::InvalidRole)?;
        if !roles.contains(&role) {
            roles.push(role);
        }
        if role == Role::Admin && !roles.contains(&Role::User) {
            roles.push(Role::User);
        }
    }
    if roles.is_empty() {
        roles.push(Role::User);
    }
    Ok(roles)
}

/// Render roles as the space-separated scope string stored in the database.
pub fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name; not unique.
    pub username: String,
    /// Login identifier; unique across users.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Registration payload. `role` is the raw role string ("ADMIN", "USER", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Validated, hashed user ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

/// Result of a completed user cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDeleted {
    pub user_id: UserId,
    /// Chatbots torn down before the user record was removed, in order.
    pub chatbots_deleted: Vec<ChatbotId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles_default_user() {
        assert_eq!(parse_roles("   ").unwrap(), vec![Role::User]);
    }

    #[test]
    fn test_parse_roles_admin_implies_user() {
        let roles = parse_roles("ADMIN").unwrap();
        assert!(roles.contains(&Role::Admin));
        assert!(roles.contains(&Role::User));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_parse_roles_deduplicates_mixed_case() {
        let roles = parse_roles("user Admin USER").unwrap();
        assert_eq!(roles, vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_parse_roles_rejects_unknown() {
        let err = parse_roles("USER ROOT").unwrap_err();
        assert!(matches!(err, UserError::InvalidRole(_)));
        assert!(err.to_string().contains("ROOT"));
    }

    #[test]
    fn test_format_roles_matches_scope_string() {
        assert_eq!(format_roles(&[Role::Admin, Role::User]), "ADMIN USER");
    }

    #[test]
    fn test_user_id_parse() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id, UserId(42));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: UserId(1),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec![Role::User],
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"USER\""));
    }
}
