//! S3-backed `ObjectStore`.

use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use bytes::Bytes;
use chatdocs_core::storage::{DELETE_BATCH_LIMIT, ObjectStore};
use chatdocs_types::config::StorageConfig;
use chatdocs_types::error::StorageError;
use secrecy::ExposeSecret;
use tracing::debug;

use super::region::{Bound, RegionBinding};

/// Error codes S3 uses for authentication and authorization failures.
const PERMISSION_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

pub struct S3ObjectStore {
    bucket: String,
    binding: Arc<RegionBinding<Client>>,
    /// Look up the bucket region before operations. Off for custom endpoints.
    adapt_region: bool,
}

impl S3ObjectStore {
    pub fn new(
        bucket: impl Into<String>,
        binding: Arc<RegionBinding<Client>>,
        adapt_region: bool,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            binding,
            adapt_region,
        }
    }

    /// Build a store from configuration.
    ///
    /// Static credentials are used when both keys are configured, otherwise
    /// the default AWS provider chain. With a custom endpoint (MinIO,
    /// LocalStack) the configured region is used as is.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::InvalidRequest(
                "bucket name is not configured".to_string(),
            ));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let endpoint = config.endpoint_url.clone();
        let force_path_style = config.force_path_style;
        let static_keys = match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        };

        let build = move |region: &str| {
            let mut builder = aws_sdk_s3::config::Builder::from(&shared)
                .region(Region::new(region.to_string()))
                .force_path_style(force_path_style);
            if let Some(endpoint) = &endpoint {
                builder = builder.endpoint_url(endpoint);
            }
            if let Some((id, secret)) = &static_keys {
                builder = builder.credentials_provider(Credentials::new(
                    id,
                    secret.expose_secret(),
                    None,
                    None,
                    "chatdocs-config",
                ));
            }
            Client::from_conf(builder.build())
        };

        let binding = RegionBinding::new(
            config.region.clone(),
            Duration::from_secs(config.region_recheck_secs),
            build,
        );
        Ok(Self::new(
            config.bucket.clone(),
            Arc::new(binding),
            config.endpoint_url.is_none(),
        ))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Region the store is currently bound to.
    pub fn region(&self) -> String {
        self.binding.region()
    }

    async fn client(&self) -> Arc<Bound<Client>> {
        if !self.adapt_region {
            return self.binding.current();
        }
        let bucket = self.bucket.clone();
        self.binding
            .refresh_with(|bound| async move { detect_bucket_region(&bound.client, &bucket).await })
            .await
    }
}

/// Ask S3 where `bucket` lives.
pub async fn detect_bucket_region(client: &Client, bucket: &str) -> Result<String, StorageError> {
    let output = client
        .get_bucket_location()
        .bucket(bucket)
        .send()
        .await
        .map_err(|e| classify("get_bucket_location", e))?;
    Ok(normalize_bucket_region(
        output.location_constraint().map(|c| c.as_str()),
    ))
}

/// Turn a `LocationConstraint` into a region name. An empty constraint is
/// `us-east-1`; the legacy `EU` constraint is `eu-west-1`.
pub fn normalize_bucket_region(constraint: Option<&str>) -> String {
    match constraint.map(str::trim) {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    match (&err, code.as_deref()) {
        (SdkError::ServiceError(_), Some(code)) if PERMISSION_CODES.contains(&code) => {
            StorageError::PermissionDenied { operation, message }
        }
        (SdkError::ServiceError(_), _) => StorageError::Rejected { operation, message },
        (SdkError::ConstructionFailure(_), _) => StorageError::InvalidRequest(message),
        _ => StorageError::Transport { operation, message },
    }
}

impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let bound = self.client().await;
        bound
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify("put_object", e))?;
        debug!(key = %key, region = %bound.region, "Stored object");
        Ok(key.to_string())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let bound = self.client().await;

        for batch in keys.chunks(DELETE_BATCH_LIMIT) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;

            let output = bound
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| classify("delete_objects", e))?;

            // Quiet mode only reports failures. Missing keys are not failures.
            let failures = output.errors();
            if let Some(first) = failures.first() {
                let message = format!(
                    "{} of {} keys not deleted, first {} ({}: {})",
                    failures.len(),
                    batch.len(),
                    first.key().unwrap_or("?"),
                    first.code().unwrap_or("unknown"),
                    first.message().unwrap_or(""),
                );
                return Err(match first.code() {
                    Some(code) if PERMISSION_CODES.contains(&code) => {
                        StorageError::PermissionDenied {
                            operation: "delete_objects",
                            message,
                        }
                    }
                    _ => StorageError::Rejected {
                        operation: "delete_objects",
                        message,
                    },
                });
            }
            debug!(keys = batch.len(), "Deleted object batch");
        }
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        if prefix.is_empty() {
            return Err(StorageError::InvalidRequest(
                "refusing to delete with an empty prefix".to_string(),
            ));
        }
        let keys = self.list_keys(prefix).await?;
        self.delete_many(&keys).await?;
        Ok(keys.len())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bound = self.client().await;
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = bound
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| classify("list_objects_v2", e))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match (page.is_truncated(), page.next_continuation_token()) {
                (Some(true), Some(token)) => continuation = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(keys)
    }
}
