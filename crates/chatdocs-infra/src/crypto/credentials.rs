//! Password hashing and access-token minting.
//!
//! Implements the `CredentialHasher` trait from `chatdocs-core`. Passwords are
//! hashed with argon2id (PHC string format, random salt). Access tokens are
//! 32 random bytes rendered as `cdk_<hex>`; only their SHA-256 digest is stored.

use aes_gcm::aead::{OsRng, rand_core::RngCore};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sha2::{Digest, Sha256};

use chatdocs_core::service::credentials::CredentialHasher;
use chatdocs_types::error::UserError;

/// Prefix of every issued access token.
pub const TOKEN_PREFIX: &str = "cdk_";

#[derive(Default)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let mut salt_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| UserError::Hashing(e.to_string()))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| UserError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    fn new_access_token(&self) -> String {
        let mut token_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut token_bytes);
        format!(
            "{TOKEN_PREFIX}{}",
            token_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
        )
    }

    fn hash_access_token(&self, token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}
