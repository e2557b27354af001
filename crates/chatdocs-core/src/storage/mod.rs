//! Object store trait.
//!
//! Defines the blob-storage interface used for chatbot documents.
//! The S3 implementation lives in chatdocs-infra.

use bytes::Bytes;
use chatdocs_types::error::StorageError;

/// Largest number of keys a single batch delete request may carry.
pub const DELETE_BATCH_LIMIT: usize = 1000;

/// Key/value blob storage with prefix deletion.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait ObjectStore: Send + Sync {
    /// Store `content` at `key`, overwriting any existing object. Returns the key.
    fn put(
        &self,
        key: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, StorageError>> + Send;

    /// Delete `keys`, chunked into batches of [`DELETE_BATCH_LIMIT`].
    ///
    /// Empty input is a no-op. Keys that do not exist count as deleted.
    fn delete_many(
        &self,
        keys: &[String],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Delete every object whose key starts with `prefix`. Returns how many
    /// keys were deleted; zero is not an error.
    fn delete_by_prefix(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<usize, StorageError>> + Send;

    /// List every key under `prefix`.
    fn list_keys(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StorageError>> + Send;
}
