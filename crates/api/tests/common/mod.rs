//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use quill_api::auth::jwt::JwtConfig;
use quill_api::config::ServerConfig;
use quill_api::router::build_app_router;
use quill_api::state::AppState;
use quill_core::revision::RevisionCapabilities;
use quill_core::types::DbId;
use quill_db::capabilities::RevisionCapabilityService;
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        db_max_connections: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            ttl_mins: 15,
        },
    }
}

fn app_with(pool: PgPool, revision_capabilities: RevisionCapabilityService) -> Router {
    build_app_router(AppState {
        pool,
        config: Arc::new(test_config()),
        revision_capabilities: Arc::new(revision_capabilities),
    })
}

/// Full application router that probes the test database's schema.
pub fn build_test_app(pool: PgPool) -> Router {
    let capabilities = RevisionCapabilityService::new(pool.clone());
    app_with(pool, capabilities)
}

/// Full application router with a fixed revision descriptor.
pub fn build_test_app_with(pool: PgPool, capabilities: RevisionCapabilities) -> Router {
    app_with(pool, RevisionCapabilityService::fixed(capabilities))
}

/// Insert an editor and return a Bearer token for them.
pub async fn editor_token(pool: &PgPool, username: &str) -> (DbId, String) {
    let id: DbId = sqlx::query_scalar(
        "INSERT INTO users (username, display_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(username)
    .bind(format!("{username} (editor)"))
    .fetch_one(pool)
    .await
    .unwrap();
    let token = test_config().jwt.issue(id, "editor").unwrap();
    (id, token)
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::GET, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        request(Method::POST, uri, None)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(
        app,
        request(Method::PUT, uri, Some(token))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
