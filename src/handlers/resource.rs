//! Catch-all handler: forwards verb, path, query and JSON body to the dispatcher.

use crate::endpoint::Verb;
use crate::error::AppError;
use crate::service::Payload;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, Uri},
    response::{IntoResponse, Response},
};

fn json_payload(body: &Bytes) -> Result<Payload, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Empty);
    }
    serde_json::from_slice(body)
        .map(Payload::Json)
        .map_err(|e| AppError::Validation(format!("body must be JSON: {}", e)))
}

pub async fn dispatch_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Response, AppError> {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    let verb = Verb::from_method(&method).ok_or_else(|| AppError::MethodNotAllowed {
        verb: method.to_string(),
        path: uri.path().to_string(),
    })?;
    let payload = json_payload(&body)?;
    let outcome = state.dispatcher.dispatch(verb, target, payload).await?;
    Ok(outcome.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_body_is_empty_payload() {
        assert!(matches!(json_payload(&Bytes::from_static(b"  \n")), Ok(Payload::Empty)));
        assert!(matches!(json_payload(&Bytes::new()), Ok(Payload::Empty)));
    }

    #[test]
    fn json_body_is_parsed() {
        let payload = json_payload(&Bytes::from_static(br#"{"title":"Hi"}"#)).unwrap();
        assert!(matches!(payload, Payload::Json(v) if v == json!({"title": "Hi"})));
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        assert!(matches!(json_payload(&Bytes::from_static(b"{nope")), Err(AppError::Validation(_))));
    }
}
