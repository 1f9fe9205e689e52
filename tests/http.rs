use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use site_gateway::{
    api_routes, common_routes_with_ready, AppError, AppState, AssetHost, Dispatcher, MemoryStore, ResourceRegistry,
    StoredAsset, UploadFile,
};
use std::sync::Arc;
use tower::ServiceExt;

struct StubHost;

#[async_trait]
impl AssetHost for StubHost {
    async fn upload(&self, file: UploadFile) -> Result<StoredAsset, AppError> {
        Ok(StoredAsset {
            path: format!("{}/{}", file.folder(), file.file_name),
            url: format!("https://cdn.example.com/{}/{}?bytes={}", file.folder(), file.file_name, file.bytes.len()),
        })
    }
}

fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_rows(
            "services",
            vec![
                json!({"id": "s1", "name": "Web", "is_active": true, "is_featured": true, "display_order": 2}),
                json!({"id": "s2", "name": "SEO", "is_active": true, "is_featured": false, "display_order": 1}),
                json!({"id": "s3", "name": "Old", "is_active": false, "is_featured": true, "display_order": 3}),
            ],
        )
        .unwrap()
        .with_rows(
            "leads",
            vec![
                json!({"id": "l1", "name": "A", "is_read": false, "created_at": "2026-01-01T00:00:00.000Z"}),
                json!({"id": "l2", "name": "B", "is_read": true, "created_at": "2026-01-02T00:00:00.000Z"}),
                json!({"id": "l3", "name": "C", "is_read": false, "created_at": "2026-01-03T00:00:00.000Z"}),
            ],
        )
        .unwrap()
}

fn app_with_limit(store: MemoryStore, upload_max_bytes: usize) -> Router {
    let dispatcher = Dispatcher::new(ResourceRegistry::site().unwrap(), Arc::new(store)).with_asset_host(Arc::new(StubHost));
    let state = AppState::new(dispatcher);
    common_routes_with_ready(state.clone()).nest("/api", api_routes(state, upload_max_bytes))
}

fn app(store: MemoryStore) -> Router {
    app_with_limit(store, 1024 * 1024)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ids(rows: &Value) -> Vec<&str> {
    rows.as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn health_and_ready_respond_ok() {
    let app = app(MemoryStore::new());
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["datastore"], "ok");
}

#[tokio::test]
async fn list_applies_default_filter_and_order() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::GET, "/api/services", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["s2", "s1"]);

    let (_, body) = send(&app, Method::GET, "/api/services?active=all", None).await;
    assert_eq!(ids(&body), vec!["s2", "s1", "s3"]);

    let (_, body) = send(&app, Method::GET, "/api/services?featured=true", None).await;
    assert_eq!(ids(&body), vec!["s1"]);
}

#[tokio::test]
async fn leads_are_newest_first_and_counted_when_unread() {
    let app = app(seeded_store());
    let (_, body) = send(&app, Method::GET, "/api/leads", None).await;
    assert_eq!(ids(&body), vec!["l3", "l2", "l1"]);

    let (status, body) = send(&app, Method::GET, "/api/leads/unread-count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));

    let (status, _) = send(&app, Method::PATCH, "/api/leads/l1", Some(json!({"is_read": true}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/leads/unread-count", None).await;
    assert_eq!(body, json!({"count": 1}));
}

#[tokio::test]
async fn unknown_endpoint_and_missing_record_have_different_codes() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::GET, "/api/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_endpoint");

    let (status, body) = send(&app, Method::GET, "/api/services/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn created_post_is_published_with_a_timestamp() {
    let app = app(MemoryStore::new());
    let (status, body) = send(&app, Method::POST, "/api/posts", Some(json!({"title": "Hi", "slug": "hi"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_published"], true);
    assert!(body["published_at"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(body["id"].as_str().is_some());

    let (status, found) = send(&app, Method::GET, "/api/posts/by-slug/hi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], body["id"]);
}

#[tokio::test]
async fn republishing_keeps_the_first_publish_time() {
    let store = MemoryStore::new()
        .with_rows(
            "blog_posts",
            vec![json!({"id": "p1", "slug": "a", "is_published": false, "published_at": "2026-03-01T00:00:00.000Z"})],
        )
        .unwrap();
    let app = app(store);
    let (status, body) = send(&app, Method::PUT, "/api/posts/p1", Some(json!({"is_published": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_published"], true);
    assert_eq!(body["published_at"], "2026-03-01T00:00:00.000Z");
    assert!(body["updated_at"].is_string());
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::PUT, "/api/services/nope", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn delete_returns_no_content() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::DELETE, "/api/services/s1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = send(&app, Method::GET, "/api/services/s1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutation_without_id_is_a_validation_error() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::DELETE, "/api/services", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn post_to_single_path_is_method_not_allowed() {
    let app = app(seeded_store());
    let (status, body) = send(&app, Method::POST, "/api/services/s1", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let app = app(seeded_store());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/services")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn settings_round_trip() {
    let app = app(MemoryStore::new());
    let (status, body) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/settings",
        Some(json!({"site_name": "Acme", "max_leads": 50, "socials": {"x": "@acme"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["site_name"], "Acme");

    let (_, _) = send(&app, Method::POST, "/api/settings", Some(json!({"site_name": "Acme Co"}))).await;
    let (_, body) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(body, json!({"site_name": "Acme Co", "max_leads": 50, "socials": {"x": "@acme"}}));
}

fn multipart_body(boundary: &str, folder: Option<&str>, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(folder) = folder {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n").as_bytes(),
        );
    }
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

async fn upload(app: &Router, body: Vec<u8>, boundary: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn upload_returns_path_and_url() {
    let app = app(MemoryStore::new());
    let boundary = "XBOUNDARY";
    let (status, body) = upload(&app, multipart_body(boundary, Some("team"), Some(("me.png", b"abc"))), boundary).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "team/me.png");
    assert_eq!(body["url"], "https://cdn.example.com/team/me.png?bytes=3");

    let (_, body) = upload(&app, multipart_body(boundary, None, Some(("a.png", b"x"))), boundary).await;
    assert_eq!(body["path"], "uploads/a.png");
}

#[tokio::test]
async fn upload_without_file_is_a_validation_error() {
    let app = app(MemoryStore::new());
    let boundary = "XBOUNDARY";
    let (status, body) = upload(&app, multipart_body(boundary, Some("team"), None), boundary).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn get_on_upload_is_method_not_allowed() {
    let app = app(MemoryStore::new());
    let (status, body) = send(&app, Method::GET, "/api/upload", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");
}

#[tokio::test]
async fn upload_over_the_limit_is_rejected() {
    let app = app_with_limit(MemoryStore::new(), 64);
    let boundary = "XBOUNDARY";
    let body = multipart_body(boundary, Some("team"), Some(("big.png", &[7u8; 256])));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

