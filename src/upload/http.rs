//! Asset host adapter posting a signed multipart form with reqwest.

use crate::config::AssetHostConfig;
use crate::error::AppError;
use crate::upload::{sign_upload, AssetHost, StoredAsset, UploadFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;

pub struct HttpAssetHost {
    client: reqwest::Client,
    config: AssetHostConfig,
}

impl HttpAssetHost {
    pub fn new(config: AssetHostConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Upload(format!("http client: {}", e)))?;
        Ok(HttpAssetHost { client, config })
    }

    fn form(&self, file: UploadFile, timestamp: i64) -> Result<Form, AppError> {
        let folder = file.folder().to_string();
        let signature = sign_upload(&folder, timestamp, &self.config.api_secret, self.config.algorithm);
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        if let Some(ct) = file.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|e| AppError::Validation(format!("invalid content type '{}': {}", ct, e)))?;
        }
        Ok(Form::new()
            .part("file", part)
            .text("folder", folder)
            .text("timestamp", timestamp.to_string())
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature))
    }
}

/// Map the host's reply to a stored asset, preferring the host's own error message.
pub(crate) fn interpret_response(status: StatusCode, body: &Value) -> Result<StoredAsset, AppError> {
    if !status.is_success() {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("asset host responded with {}", status));
        return Err(AppError::Upload(message));
    }
    let path = body
        .get("public_id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upload("asset host response has no public_id".into()))?;
    let url = body
        .get("secure_url")
        .or_else(|| body.get("url"))
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upload("asset host response has no url".into()))?;
    Ok(StoredAsset {
        path: path.to_string(),
        url: url.to_string(),
    })
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload(&self, file: UploadFile) -> Result<StoredAsset, AppError> {
        let timestamp = chrono::Utc::now().timestamp();
        let folder = file.folder().to_string();
        let size = file.bytes.len();
        let form = self.form(file, timestamp)?;
        tracing::debug!(
            folder = %folder,
            size,
            algorithm = self.config.algorithm.as_str(),
            "uploading asset"
        );

        let response = self
            .client
            .post(&self.config.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_else(|e| {
            tracing::debug!(status = %status, error = %e, "asset host reply is not JSON");
            Value::Null
        });
        let result = interpret_response(status, &body);
        if let Err(e) = &result {
            tracing::warn!(status = %status, error = %e, "asset upload rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_yields_path_and_secure_url() {
        let body = json!({
            "public_id": "portfolio/abc123",
            "secure_url": "https://res.example.com/portfolio/abc123.png",
            "url": "http://res.example.com/portfolio/abc123.png"
        });
        let asset = interpret_response(StatusCode::OK, &body).unwrap();
        assert_eq!(asset.path, "portfolio/abc123");
        assert_eq!(asset.url, "https://res.example.com/portfolio/abc123.png");
    }

    #[test]
    fn remote_error_message_is_preferred() {
        let body = json!({"error": {"message": "Invalid Signature 1234"}});
        let err = interpret_response(StatusCode::UNAUTHORIZED, &body).unwrap_err();
        assert_eq!(err.to_string(), "upload: Invalid Signature 1234");
    }

    #[test]
    fn generic_message_without_remote_detail() {
        let err = interpret_response(StatusCode::BAD_GATEWAY, &Value::Null).unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn success_without_identifier_is_an_error() {
        let err = interpret_response(StatusCode::OK, &json!({"secure_url": "x"})).unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }
}
