//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate route: {0}")]
    DuplicateRoute(String),
    #[error("invalid route '{route}': {reason}")]
    InvalidRoute { route: String, reason: &'static str },
    #[error("config load: {0}")]
    Load(String),
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failure reported by a datastore adapter. The message is carried through untouched.
#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The path matched neither a special pattern nor a registered resource.
    #[error("unknown endpoint: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Datastore(#[from] DatastoreError),
    #[error("upload: {0}")]
    Upload(String),
    #[error("method {verb} not allowed on {path}")]
    MethodNotAllowed { verb: String, path: String },
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Datastore(DatastoreError::Sqlx(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Parse(_) => (StatusCode::NOT_FOUND, "unknown_endpoint"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Datastore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Upload(_) => (StatusCode::BAD_GATEWAY, "upload_error"),
            AppError::MethodNotAllowed { .. } => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_endpoint_and_missing_record_are_distinct() {
        let parse = AppError::Parse("/nonexistent".into());
        let missing = AppError::NotFound("services/does-not-exist".into());
        assert_eq!(parse.status_and_code().1, "unknown_endpoint");
        assert_eq!(missing.status_and_code().1, "not_found");
    }

    #[test]
    fn datastore_message_is_kept_intact() {
        let err = AppError::from(DatastoreError::Rejected("duplicate key value violates unique constraint".into()));
        assert_eq!(err.to_string(), "database: duplicate key value violates unique constraint");
    }
}
