//! Multipart upload handler: reads `file` and `folder`, then dispatches `POST /upload`.

use crate::endpoint::Verb;
use crate::error::AppError;
use crate::service::Payload;
use crate::state::AppState;
use crate::upload::UploadFile;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, AppError> {
    let mut file: Option<UploadFile> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read file: {}", e)))?;
                file = Some(UploadFile {
                    file_name,
                    content_type,
                    bytes,
                    folder: None,
                });
            }
            "folder" => {
                folder = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("failed to read folder: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let mut file = file.ok_or_else(|| AppError::Validation("multipart field 'file' is required".into()))?;
    file.folder = folder;
    let outcome = state
        .dispatcher
        .dispatch(Verb::Post, "/upload", Payload::File(file))
        .await?;
    Ok(outcome.into_response())
}
