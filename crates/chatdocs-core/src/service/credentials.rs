//! Credential hashing trait.
//!
//! Defines the interface for password hashing and access-token minting.
//! The argon2/sha2 implementation lives in chatdocs-infra.

use chatdocs_types::error::UserError;

/// Hashes passwords and access tokens.
pub trait CredentialHasher: Send + Sync {
    /// Hash a password for storage (salted, slow).
    fn hash_password(&self, password: &str) -> Result<String, UserError>;

    /// Check `password` against a stored hash. Malformed hashes verify as false.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Mint a fresh random access token in plaintext.
    fn new_access_token(&self) -> String;

    /// Deterministic digest of an access token, used as its lookup key.
    fn hash_access_token(&self, token: &str) -> String;
}
