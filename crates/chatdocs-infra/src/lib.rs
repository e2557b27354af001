//! Infrastructure layer for chatdocs.
//!
//! Contains implementations of the ports defined in `chatdocs-core`:
//! SQLite record storage, the S3 object store with bucket-region adaptation,
//! the HTTP client for the processing service, and credential hashing
//! (argon2 passwords, SHA-256 token digests). Also loads configuration.

pub mod config;
pub mod crypto;
pub mod processing;
pub mod s3;
pub mod sqlite;
