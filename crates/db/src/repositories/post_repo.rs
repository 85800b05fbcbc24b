//! Repository for the `posts` table.
//!
//! Every content-changing write records a revision in the same transaction,
//! and restores are applied here since they rewrite the live post.

use quill_core::revision::{
    build_record_update, render_update, restore_note, FieldValue, RevisionCapabilities,
    RevisionSnapshot, TrackedField,
};
use quill_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::binding::bind_columns;
use crate::models::post::{CreatePost, Post, RestoredPost, UpdatePost};
use crate::repositories::revision_repo::RevisionRepo;

/// Column list for posts queries.
const COLUMNS: &str = "id, title, slug, content, content_markdown, excerpt, cover_image, \
    is_featured, allow_comments, status, author_id, published_at, created_at, updated_at";

/// Note recorded on a post's first revision when the caller gives none.
pub const INITIAL_REVISION_NOTE: &str = "Initial version";

/// Provides CRUD and restore operations for posts.
pub struct PostRepo;

impl PostRepo {
    /// Create a new post and its first revision.
    pub async fn create(
        pool: &PgPool,
        caps: &RevisionCapabilities,
        input: &CreatePost,
        slug: &str,
        editor_id: Option<DbId>,
    ) -> Result<Post, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO posts
                (title, slug, content, content_markdown, excerpt, cover_image,
                 is_featured, allow_comments, status, author_id, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, false), COALESCE($8, true),
                     COALESCE($9, 'draft'), $10, $11)
             RETURNING {COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.content)
            .bind(&input.content_markdown)
            .bind(&input.excerpt)
            .bind(&input.cover_image)
            .bind(input.is_featured)
            .bind(input.allow_comments)
            .bind(&input.status)
            .bind(input.author_id)
            .bind(input.published_at)
            .fetch_one(&mut *tx)
            .await?;

        let note = input
            .change_summary
            .as_deref()
            .unwrap_or(INITIAL_REVISION_NOTE);
        RevisionRepo::write(&mut *tx, caps, &post.snapshot(), editor_id, Some(note)).await?;

        tx.commit().await?;
        Ok(post)
    }

    /// Find a post by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a post. Only non-`None` fields in `input` are applied, and a
    /// revision of the resulting state is recorded in the same transaction.
    ///
    /// Returns `None` if no post with the given `id` exists. An update that
    /// writes nothing returns the post unchanged without a new revision.
    pub async fn update(
        pool: &PgPool,
        caps: &RevisionCapabilities,
        id: DbId,
        input: &UpdatePost,
        editor_id: Option<DbId>,
    ) -> Result<Option<Post>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::lock_for_update(&mut *tx, id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        if input.is_empty() {
            tx.rollback().await?;
            return Ok(Some(current));
        }

        let post = Self::apply_snapshot(&mut *tx, &input.changes(&current)).await?;
        RevisionRepo::write(
            &mut *tx,
            caps,
            &post.snapshot(),
            editor_id,
            input.change_summary.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(post))
    }

    /// Roll a post back to one of its revisions.
    ///
    /// Locks the live post, then the revision row, applies the revision's
    /// captured fields onto the post and records the result as a new
    /// revision, all in one transaction. Returns `None` (with nothing
    /// changed) if the post or the revision does not exist. Any database
    /// error rolls the whole restore back and is returned unchanged.
    pub async fn restore_revision(
        pool: &PgPool,
        caps: &RevisionCapabilities,
        post_id: DbId,
        revision_id: DbId,
        editor_id: Option<DbId>,
    ) -> Result<Option<RestoredPost>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if Self::lock_for_update(&mut *tx, post_id).await?.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(row) = RevisionRepo::find_row(&mut *tx, caps, post_id, revision_id, true).await?
        else {
            tx.rollback().await?;
            tracing::debug!(post_id, revision_id, "Restore target not found");
            return Ok(None);
        };

        let position = RevisionRepo::position_of(&mut *tx, &row).await?;
        let note = restore_note(position);
        let mut snapshot = row.to_snapshot(caps);
        let dropped_author = Self::forget_missing_author(&mut *tx, &mut snapshot).await?;
        let post = Self::apply_snapshot(&mut *tx, &snapshot).await?;
        if dropped_author {
            // Record the author the post kept.
            snapshot.set(TrackedField::AuthorId, post.author_id);
        }
        let new_revision_id = RevisionRepo::write(
            &mut *tx,
            caps,
            &snapshot,
            editor_id,
            Some(note.as_str()),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            post_id,
            restored_from = revision_id,
            revision_id = new_revision_id,
            ?editor_id,
            "Post restored to earlier revision"
        );

        Ok(Some(RestoredPost {
            post,
            restored_from: revision_id,
            revision_id: new_revision_id,
        }))
    }

    /// Load a post and hold its row lock until the transaction ends.
    async fn lock_for_update(conn: &mut PgConnection, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Forget a captured `author_id` whose user no longer exists, so the
    /// restore keeps the live author. Returns whether it was forgotten.
    ///
    /// Surviving authors are locked `FOR KEY SHARE` until the transaction
    /// ends so they cannot disappear before the post is written.
    async fn forget_missing_author(
        conn: &mut PgConnection,
        snapshot: &mut RevisionSnapshot,
    ) -> Result<bool, sqlx::Error> {
        let Some(&FieldValue::Id(Some(author_id))) = snapshot.get(TrackedField::AuthorId) else {
            return Ok(false);
        };

        let found: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR KEY SHARE")
                .bind(author_id)
                .fetch_optional(&mut *conn)
                .await?;
        if found.is_some() {
            return Ok(false);
        }

        snapshot.forget(TrackedField::AuthorId);
        tracing::debug!(
            post_id = snapshot.post_id,
            author_id,
            "Captured author no longer exists, keeping live author"
        );
        Ok(true)
    }

    /// Write the snapshot's declared fields onto the live post and touch
    /// `updated_at`. Undeclared fields keep their current values.
    async fn apply_snapshot(
        conn: &mut PgConnection,
        snapshot: &RevisionSnapshot,
    ) -> Result<Post, sqlx::Error> {
        let columns = build_record_update(snapshot);
        let query = render_update("posts", &columns, &[("updated_at", "NOW()")], COLUMNS);
        bind_columns(sqlx::query_as::<_, Post>(&query), &columns)
            .bind(snapshot.post_id)
            .fetch_one(&mut *conn)
            .await
    }
}
