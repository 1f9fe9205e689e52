//! Resource API: multipart `/upload` plus a fallback that hands every other
//! path to the dispatcher.

use crate::handlers::{dispatch_request, upload};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::convert::Infallible;
use tower_http::limit::RequestBodyLimitLayer;

pub fn api_routes(state: AppState, upload_max_bytes: usize) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload)
                .fallback(dispatch_request)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_max_bytes)),
        )
        .fallback(dispatch_request)
        .with_state(state)
}
