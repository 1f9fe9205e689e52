//! Signed uploads to the external asset host.
//!
//! The signature is `H("folder=" + folder + "&timestamp=" + unix_seconds + secret)`,
//! lowercase hex. The host recomputes it, so the template and hash must match its
//! verification exactly.

mod http;

pub use http::HttpAssetHost;

use crate::error::{AppError, ConfigError};
use async_trait::async_trait;
use axum::body::Bytes;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Folder used when the upload form carries none.
pub const DEFAULT_FOLDER: &str = "uploads";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    /// Name accepted in `ASSET_SIGNATURE_ALGORITHM` and used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(ConfigError::Validation(format!(
                "invalid signature algorithm: {} (expected sha1 or sha256)",
                other
            ))),
        }
    }
}

/// Hex digest over the fixed `folder=..&timestamp=..` template followed by the secret.
pub fn sign_upload(folder: &str, timestamp: i64, secret: &str, algorithm: SignatureAlgorithm) -> String {
    let payload = format!("folder={}&timestamp={}{}", folder, timestamp, secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(payload.as_bytes())),
    }
}

/// File received from the client, plus its destination folder.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub folder: Option<String>,
}

impl UploadFile {
    pub fn folder(&self) -> &str {
        self.folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FOLDER)
    }
}

/// Stored object as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    pub path: String,
    pub url: String,
}

#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<StoredAsset, AppError>;
}
