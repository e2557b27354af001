//! Gateway configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.chatdocs/` unless
//! `CHATDOCS_DATA_DIR` is set), then applies environment overrides. Falls
//! back to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use chatdocs_types::config::GatewayConfig;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration that cannot be used to start the gateway.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("storage bucket is not configured (set AWS_BUCKET_NAME or storage.bucket)")]
    MissingBucket,

    #[error("AWS_ACCESS_KEY_ID is set without AWS_SECRET_ACCESS_KEY")]
    MissingSecretKey,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Resolve the data directory: `CHATDOCS_DATA_DIR`, else `~/.chatdocs`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATDOCS_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chatdocs")
}

/// Load `{data_dir}/config.toml` and apply process environment overrides.
pub async fn load_gateway_config(data_dir: &Path) -> Result<GatewayConfig, ConfigError> {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Parse the config file, returning defaults when it is missing or broken.
pub async fn read_config_file(data_dir: &Path) -> GatewayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    match toml::from_str::<GatewayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GatewayConfig::default()
        }
    }
}

/// Apply environment overrides. `lookup` returns the value of a variable;
/// empty values are treated as unset.
pub fn apply_env_overrides(
    config: &mut GatewayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("CHATDOCS_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(bucket) = get("AWS_BUCKET_NAME") {
        config.storage.bucket = bucket;
    }
    if let Some(region) = get("AWS_REGION") {
        config.storage.region = region;
    }
    if let Some(key) = get("AWS_ACCESS_KEY_ID") {
        config.storage.access_key_id = Some(key);
    }
    if let Some(secret) = get("AWS_SECRET_ACCESS_KEY") {
        config.storage.secret_access_key = Some(SecretString::from(secret));
    }
    if let Some(endpoint) = get("AWS_ENDPOINT_URL") {
        config.storage.endpoint_url = Some(endpoint);
    }
    if let Some(flag) = get("AWS_S3_FORCE_PATH_STYLE") {
        config.storage.force_path_style = parse_bool("AWS_S3_FORCE_PATH_STYLE", &flag)?;
    }
    if let Some(url) = get("PYTHON_SERVICE_URL") {
        config.processing.base_url = url;
    }
    if let Some(origin) = get("CORS_ORIGIN") {
        config.server.cors_origin = origin;
    }
    if let Some(minutes) = get("TOKEN_TTL_MINUTES") {
        config.auth.token_ttl_minutes =
            minutes.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "TOKEN_TTL_MINUTES",
                message: format!("{e}"),
            })?;
    }
    if let Some(port) = get("PORT") {
        config.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: "PORT",
            message: format!("{e}"),
        })?;
    }
    Ok(())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Check that the configuration can start the server.
pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    if config.storage.bucket.trim().is_empty() {
        return Err(ConfigError::MissingBucket);
    }
    if config.storage.access_key_id.is_some() && config.storage.secret_access_key.is_none() {
        return Err(ConfigError::MissingSecretKey);
    }
    if config.auth.token_ttl_minutes == 0 {
        return Err(ConfigError::InvalidValue {
            key: "auth.token_ttl_minutes",
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn read_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 8085);
        assert!(config.storage.bucket.is_empty());
    }

    #[tokio::test]
    async fn read_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
database_url = "sqlite:///tmp/x.db"

[storage]
bucket = "chatbot-docs"
region = "eu-central-1"

[processing]
base_url = "http://processor:8000"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///tmp/x.db"));
        assert_eq!(config.storage.bucket, "chatbot-docs");
        assert_eq!(config.storage.region, "eu-central-1");
        assert_eq!(config.processing.base_url, "http://processor:8000");
        assert_eq!(config.processing.timeout_secs, 120);
    }

    #[tokio::test]
    async fn read_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.storage.region, "us-east-1");
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = GatewayConfig::default();
        config.storage.bucket = "from-file".to_string();

        apply_env_overrides(
            &mut config,
            env(&[
                ("AWS_BUCKET_NAME", "from-env"),
                ("AWS_REGION", "ap-south-1"),
                ("AWS_S3_FORCE_PATH_STYLE", "true"),
                ("AWS_ENDPOINT_URL", "http://minio:9000"),
                ("PYTHON_SERVICE_URL", "http://py:8000"),
                ("CORS_ORIGIN", "https://app.example.com"),
                ("PORT", "9090"),
                ("TOKEN_TTL_MINUTES", "60"),
            ]),
        )
        .unwrap();

        assert_eq!(config.storage.bucket, "from-env");
        assert_eq!(config.storage.region, "ap-south-1");
        assert!(config.storage.force_path_style);
        assert_eq!(config.storage.endpoint_url.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.processing.base_url, "http://py:8000");
        assert_eq!(config.server.cors_origin, "https://app.example.com");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.token_ttl_minutes, 60);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env(&[("AWS_REGION", "  ")])).unwrap();
        assert_eq!(config.storage.region, "us-east-1");
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));

        let err = apply_env_overrides(&mut config, env(&[("TOKEN_TTL_MINUTES", "-5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TOKEN_TTL_MINUTES", .. }));

        let err =
            apply_env_overrides(&mut config, env(&[("AWS_S3_FORCE_PATH_STYLE", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn validate_requires_bucket_and_paired_keys() {
        let mut config = GatewayConfig::default();
        assert_eq!(validate(&config), Err(ConfigError::MissingBucket));

        config.storage.bucket = "docs".to_string();
        assert_eq!(validate(&config), Ok(()));

        config.storage.access_key_id = Some("AKIA".to_string());
        assert_eq!(validate(&config), Err(ConfigError::MissingSecretKey));

        config.storage.secret_access_key = Some(SecretString::from("secret"));
        assert_eq!(validate(&config), Ok(()));

        config.auth.token_ttl_minutes = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidValue { key: "auth.token_ttl_minutes", .. })
        ));
    }
}
