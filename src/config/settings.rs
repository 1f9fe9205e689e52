//! Process settings from the environment.

use crate::error::ConfigError;
use crate::upload::SignatureAlgorithm;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Credentials and endpoint of the external asset host.
#[derive(Clone, Debug)]
pub struct AssetHostConfig {
    pub upload_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub algorithm: SignatureAlgorithm,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct GatewaySettings {
    /// Postgres URL. Without one the gateway runs on the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub registry_path: Option<PathBuf>,
    pub asset_host: Option<AssetHostConfig>,
    pub upload_max_bytes: usize,
}

impl GatewaySettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let upload_max_bytes = match get("UPLOAD_MAX_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Validation(format!("UPLOAD_MAX_BYTES is not a byte count: {}", v)))?,
            None => DEFAULT_UPLOAD_MAX_BYTES,
        };

        let asset_host = match (get("ASSET_API_KEY"), get("ASSET_API_SECRET")) {
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnv("ASSET_API_SECRET")),
            (None, Some(_)) => return Err(ConfigError::MissingEnv("ASSET_API_KEY")),
            (Some(api_key), Some(api_secret)) => {
                let upload_url = match (get("ASSET_UPLOAD_URL"), get("ASSET_CLOUD_NAME")) {
                    (Some(url), _) => url,
                    (None, Some(cloud)) => format!("https://api.cloudinary.com/v1_1/{}/auto/upload", cloud),
                    (None, None) => return Err(ConfigError::MissingEnv("ASSET_CLOUD_NAME")),
                };
                let algorithm = match get("ASSET_SIGNATURE_ALGORITHM") {
                    Some(v) => v.parse()?,
                    None => SignatureAlgorithm::default(),
                };
                let timeout = match get("ASSET_TIMEOUT_SECS") {
                    Some(v) => Duration::from_secs(
                        v.parse()
                            .map_err(|_| ConfigError::Validation(format!("ASSET_TIMEOUT_SECS is not a number: {}", v)))?,
                    ),
                    None => Duration::from_secs(30),
                };
                Some(AssetHostConfig {
                    upload_url,
                    api_key,
                    api_secret,
                    algorithm,
                    timeout,
                })
            }
        };

        Ok(GatewaySettings {
            database_url: get("DATABASE_URL"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            registry_path: get("REGISTRY_PATH").map(PathBuf::from),
            asset_host,
            upload_max_bytes,
        })
    }
}
