//! HTTP mapping of dispatch outcomes. Bodies are the bare result, not wrapped.

use crate::service::Outcome;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CountBody {
    pub count: u64,
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Rows(rows) => success_ok(rows).into_response(),
            Outcome::Row(row) => success_ok(row).into_response(),
            Outcome::Created(row) => success_created(row).into_response(),
            Outcome::Count(count) => success_ok(CountBody { count }).into_response(),
            Outcome::Settings(map) => success_ok(map).into_response(),
            Outcome::Asset(asset) => success_ok(asset).into_response(),
            Outcome::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}
