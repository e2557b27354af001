//! Gateway configuration types.
//!
//! `GatewayConfig` mirrors `config.toml` in the data directory. Every field
//! has a default, so a partial file (or none at all) is valid; environment
//! overrides are applied by the infra loader.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    /// SQLite URL. Empty means `{data_dir}/chatdocs.db`.
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
    pub auth: AuthConfig,
    pub admin: AdminBootstrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Single origin allowed by CORS.
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8085,
            cors_origin: "http://localhost:4200".to_string(),
        }
    }
}

/// S3 object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    /// Region assumed until the bucket's real region has been looked up.
    pub region: String,
    /// Custom endpoint (MinIO, LocalStack). When unset the regional AWS
    /// endpoint `https://s3.{region}.amazonaws.com` is used.
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    /// Static credentials. When unset the default AWS provider chain is used.
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<SecretString>,
    /// Minimum seconds between bucket-region lookups.
    pub region_recheck_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
            region_recheck_secs: 300,
        }
    }
}

/// External document-processing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Access token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Minutes a token authenticates after login.
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 10,
        }
    }
}

/// Administrator account created on `serve` when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminBootstrap {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,
}

impl AdminBootstrap {
    /// Email and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (
            self.email.as_deref(),
            self.password.as_ref().map(|p| p.expose_secret()),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}
