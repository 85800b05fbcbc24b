//! Shared fixtures for the database integration tests.

#![allow(dead_code)]

use quill_core::revision::RevisionCapabilities;
use quill_core::types::DbId;
use quill_db::models::post::{CreatePost, Post, UpdatePost};
use quill_db::repositories::PostRepo;
use sqlx::PgPool;

pub fn new_post(title: &str, content: &str) -> CreatePost {
    CreatePost {
        title: title.to_string(),
        slug: None,
        content: content.to_string(),
        content_markdown: None,
        excerpt: None,
        cover_image: None,
        is_featured: None,
        allow_comments: None,
        status: None,
        author_id: None,
        published_at: None,
        change_summary: None,
    }
}

/// Create a post (and its first revision) with a slug derived from `title`.
pub async fn create_post(
    pool: &PgPool,
    caps: &RevisionCapabilities,
    title: &str,
    content: &str,
) -> Post {
    let slug = quill_core::post::generate_slug(title);
    PostRepo::create(pool, caps, &new_post(title, content), &slug, None)
        .await
        .unwrap()
}

/// Update only the rendered content of a post.
pub async fn edit_content(
    pool: &PgPool,
    caps: &RevisionCapabilities,
    post_id: DbId,
    content: &str,
    editor_id: Option<DbId>,
) -> Post {
    let input = UpdatePost {
        content: Some(content.to_string()),
        ..UpdatePost::default()
    };
    PostRepo::update(pool, caps, post_id, &input, editor_id)
        .await
        .unwrap()
        .expect("post should exist")
}

pub async fn create_user(pool: &PgPool, username: &str, display_name: Option<&str>) -> DbId {
    sqlx::query_scalar("INSERT INTO users (username, display_name) VALUES ($1, $2) RETURNING id")
        .bind(username)
        .bind(display_name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn revision_count(pool: &PgPool, post_id: DbId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM post_revisions WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Stored revision numbers for a post in ascending order.
pub async fn stored_numbers(pool: &PgPool, post_id: DbId) -> Vec<i32> {
    sqlx::query_scalar(
        "SELECT revision_number FROM post_revisions WHERE post_id = $1 ORDER BY revision_number",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

/// Drop optional revision columns to emulate an older deployment.
pub async fn drop_revision_columns(pool: &PgPool, columns: &[&str]) {
    for column in columns {
        sqlx::query(&format!("ALTER TABLE post_revisions DROP COLUMN {column}"))
            .execute(pool)
            .await
            .unwrap();
    }
}
