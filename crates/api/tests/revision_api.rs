//! HTTP-level integration tests for post and revision endpoints.
//!
//! Requests go straight to the router through `tower::ServiceExt`. Editors
//! are inserted directly and authenticate with locally issued tokens.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, editor_token, get, get_auth, post_auth,
    post_json, post_json_auth, put_json_auth,
};
use quill_core::revision::RevisionCapabilities;
use quill_core::types::DbId;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_post(app: axum::Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/posts", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn update_post(app: axum::Router, token: &str, id: DbId, body: Value) -> Value {
    let response = put_json_auth(app, &format!("/api/v1/posts/{id}"), body, token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn list_revisions(app: axum::Router, token: &str, id: DbId) -> Vec<Value> {
    let response = get_auth(app, &format!("/api/v1/posts/{id}/revisions"), token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .expect("data should be an array")
        .clone()
}

/// Create a post with three revisions (draft, published, featured) and return
/// its id.
async fn published_history(app: &axum::Router, token: &str) -> DbId {
    let post = create_post(
        app.clone(),
        token,
        json!({ "title": "Launch Day", "content": "draft" }),
    )
    .await;
    let id = post["id"].as_i64().unwrap();

    update_post(
        app.clone(),
        token,
        id,
        json!({ "content": "published", "status": "published" }),
    )
    .await;
    update_post(
        app.clone(),
        token,
        id,
        json!({ "content": "featured", "is_featured": true, "change_summary": "Feature it" }),
    )
    .await;
    id
}

fn revision_id_at(list: &[Value], number: i64) -> DbId {
    list.iter()
        .find(|r| r["revision_number"] == number)
        .and_then(|r| r["id"].as_i64())
        .expect("revision should be listed")
}

// ---------------------------------------------------------------------------
// Test: authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requests_without_token_are_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(app.clone(), "/api/v1/posts/1/revisions").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = post_json(app, "/api/v1/posts", json!({ "title": "x", "content": "y" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_garbage_token_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get_auth(app, "/api/v1/posts/1", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Test: post CRUD records revisions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_post_records_first_revision(pool: PgPool) {
    let (editor_id, token) = editor_token(&pool, "writer").await;
    let app = build_test_app(pool);

    let post = create_post(
        app.clone(),
        &token,
        json!({ "title": "Hello World", "content": "<p>hi</p>" }),
    )
    .await;
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["status"], "draft");
    let id = post["id"].as_i64().unwrap();

    let revisions = list_revisions(app, &token, id).await;
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0]["revision_number"], 1);
    assert_eq!(revisions[0]["is_latest"], true);
    assert_eq!(revisions[0]["editor_id"], editor_id);
    assert_eq!(revisions[0]["editor_name"], "writer (editor)");
    assert_eq!(revisions[0]["diff_summary"], "Initial version");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_post(pool: PgPool) {
    let (_, token) = editor_token(&pool, "reader").await;
    let app = build_test_app(pool);
    let post = create_post(
        app.clone(),
        &token,
        json!({ "title": "Readable", "content": "body" }),
    )
    .await;

    let response = get_auth(app.clone(), &format!("/api/v1/posts/{}", post["id"]), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Readable");

    let response = get_auth(app, "/api/v1/posts/999999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_input_is_rejected(pool: PgPool) {
    let (_, token) = editor_token(&pool, "strict").await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/posts",
        json!({ "title": "", "content": "x" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let post = create_post(app.clone(), &token, json!({ "title": "Valid", "content": "x" })).await;
    let response = put_json_auth(
        app,
        &format!("/api/v1/posts/{}", post["id"]),
        json!({ "status": "deleted" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_slug_conflicts(pool: PgPool) {
    let (_, token) = editor_token(&pool, "dup").await;
    let app = build_test_app(pool);
    create_post(app.clone(), &token, json!({ "title": "Same Title", "content": "a" })).await;

    let response = post_json_auth(
        app,
        "/api/v1/posts",
        json!({ "title": "Same Title", "content": "b" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_unknown_post_is_404(pool: PgPool) {
    let (_, token) = editor_token(&pool, "ghost").await;
    let app = build_test_app(pool);

    let response = put_json_auth(
        app,
        "/api/v1/posts/123456",
        json!({ "content": "x" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: revision list and detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_and_detail_agree(pool: PgPool) {
    let (_, token) = editor_token(&pool, "historian").await;
    let app = build_test_app(pool);
    let id = published_history(&app, &token).await;

    let revisions = list_revisions(app.clone(), &token, id).await;
    let numbers: Vec<i64> = revisions
        .iter()
        .map(|r| r["revision_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(revisions[0]["diff_summary"], "Feature it");
    assert_eq!(revisions[1]["diff_summary"], Value::Null);

    for summary in &revisions {
        let uri = format!("/api/v1/posts/{id}/revisions/{}", summary["id"]);
        let response = get_auth(app.clone(), &uri, &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        let detail = body_json(response).await["data"].clone();

        assert_eq!(detail["revision_number"], summary["revision_number"]);
        assert_eq!(detail["is_latest"], summary["is_latest"]);
        assert_eq!(detail["total_revisions"], 3);
    }

    let first = revision_id_at(&revisions, 1);
    let detail = body_json(
        get_auth(
            app,
            &format!("/api/v1/posts/{id}/revisions/{first}"),
            &token,
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(detail["content"], "draft");
    assert_eq!(detail["status"], "draft");
    assert_eq!(detail["title"], "Launch Day");
    assert_eq!(detail["is_featured"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_revision_and_post_are_404(pool: PgPool) {
    let (_, token) = editor_token(&pool, "lost").await;
    let app = build_test_app(pool);
    let id = published_history(&app, &token).await;
    let other = create_post(app.clone(), &token, json!({ "title": "Other", "content": "o" })).await;
    let other_id = other["id"].as_i64().unwrap();
    let foreign = revision_id_at(&list_revisions(app.clone(), &token, other_id).await, 1);

    let response = get_auth(app.clone(), "/api/v1/posts/999999/revisions", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/posts/{id}/revisions/999999"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "revision with id 999999 not found");

    let response = get_auth(
        app,
        &format!("/api/v1/posts/{id}/revisions/{foreign}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: restore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_first_revision(pool: PgPool) {
    let (_, author) = editor_token(&pool, "author").await;
    let (restorer_id, restorer) = editor_token(&pool, "restorer").await;
    let app = build_test_app(pool);
    let id = published_history(&app, &author).await;
    let first = revision_id_at(&list_revisions(app.clone(), &author, id).await, 1);

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/posts/{id}/revisions/{first}/restore"),
        &restorer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let restored = body_json(response).await["data"].clone();
    assert_eq!(restored["restored_from"], first);
    assert_eq!(restored["post"]["content"], "draft");
    assert_eq!(restored["post"]["status"], "draft");
    assert_eq!(restored["post"]["is_featured"], false);

    let live = body_json(get_auth(app.clone(), &format!("/api/v1/posts/{id}"), &author).await)
        .await["data"]
        .clone();
    assert_eq!(live["content"], "draft");

    let revisions = list_revisions(app, &author, id).await;
    assert_eq!(revisions.len(), 4);
    assert_eq!(revisions[0]["id"], restored["revision_id"]);
    assert_eq!(revisions[0]["revision_number"], 4);
    assert_eq!(revisions[0]["is_latest"], true);
    assert_eq!(revisions[0]["editor_id"], restorer_id);
    assert_eq!(revisions[0]["diff_summary"], "Restored from revision 1");
    assert_eq!(revisions[1]["diff_summary"], "Feature it");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_missing_targets_are_404(pool: PgPool) {
    let (_, token) = editor_token(&pool, "careful").await;
    let app = build_test_app(pool);
    let id = published_history(&app, &token).await;
    let other = create_post(app.clone(), &token, json!({ "title": "Elsewhere", "content": "e" })).await;
    let other_id = other["id"].as_i64().unwrap();
    let foreign = revision_id_at(&list_revisions(app.clone(), &token, other_id).await, 1);

    for uri in [
        format!("/api/v1/posts/{id}/revisions/999999/restore"),
        format!("/api/v1/posts/{id}/revisions/{foreign}/restore"),
        "/api/v1/posts/999999/revisions/1/restore".to_string(),
    ] {
        let response = post_auth(app.clone(), &uri, &token).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    assert_eq!(list_revisions(app.clone(), &token, id).await.len(), 3);
    let live = body_json(get_auth(app, &format!("/api/v1/posts/{id}"), &token).await).await["data"]
        .clone();
    assert_eq!(live["content"], "featured");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_restores_over_http(pool: PgPool) {
    let (_, token) = editor_token(&pool, "racer").await;
    let app = build_test_app(pool);
    let id = published_history(&app, &token).await;
    let revisions = list_revisions(app.clone(), &token, id).await;

    let requests = revisions.iter().map(|r| {
        let uri = format!("/api/v1/posts/{id}/revisions/{}/restore", r["id"]);
        let app = app.clone();
        let token = token.clone();
        async move { post_auth(app, &uri, &token).await.status() }
    });
    for status in futures::future::join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
    }

    let numbers: Vec<i64> = list_revisions(app, &token, id)
        .await
        .iter()
        .map(|r| r["revision_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![6, 5, 4, 3, 2, 1]);
}

// ---------------------------------------------------------------------------
// Test: content-only schema
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_content_only_history(pool: PgPool) {
    let (_, token) = editor_token(&pool, "minimal").await;
    let app = build_test_app_with(pool, RevisionCapabilities::default());
    let post = create_post(
        app.clone(),
        &token,
        json!({ "title": "Minimal", "content": "one" }),
    )
    .await;
    let id = post["id"].as_i64().unwrap();
    update_post(
        app.clone(),
        &token,
        id,
        json!({ "title": "Minimal, renamed", "content": "two" }),
    )
    .await;

    let revisions = list_revisions(app.clone(), &token, id).await;
    assert_eq!(revisions[0]["revision_number"], 2);
    assert_eq!(revisions[1]["revision_number"], 1);
    assert_eq!(revisions[1]["diff_summary"], Value::Null);

    let first = revision_id_at(&revisions, 1);
    let detail = body_json(
        get_auth(
            app.clone(),
            &format!("/api/v1/posts/{id}/revisions/{first}"),
            &token,
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(detail["content"], "one");
    assert_eq!(detail["title"], Value::Null);

    let response = post_auth(
        app,
        &format!("/api/v1/posts/{id}/revisions/{first}/restore"),
        &token,
    )
    .await;
    let restored = body_json(response).await["data"].clone();
    assert_eq!(restored["post"]["content"], "one");
    assert_eq!(restored["post"]["title"], "Minimal, renamed");
}
