//! Cryptographic operations for chatdocs.
//!
//! - `credentials`: argon2id password hashing and SHA-256 access-token digests

pub mod credentials;
