//! Repository for the `post_revisions` table.
//!
//! Revisions are append-only: this repository inserts and reads rows but
//! never updates or deletes them. Writes are serialized per post so revision
//! numbers stay contiguous under concurrent editors.

use quill_core::revision::{
    build_revision_insert, list_ordinals, render_insert, revision_detail_columns,
    revision_lock_key, revision_summary_columns, valid_revision_number, RevisionCapabilities,
    RevisionSnapshot, REVISION_LOCK_NAMESPACE, REVISION_TABLE,
};
use quill_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::binding::bind_columns;
use crate::models::revision::{RevisionDetail, RevisionRow, RevisionSummary, RevisionSummaryRow};

/// Provides the append and read operations for post revisions.
pub struct RevisionRepo;

impl RevisionRepo {
    // ── Writer ───────────────────────────────────────────────────────

    /// Append a revision for `snapshot.post_id` inside the caller's transaction.
    ///
    /// Holds the post's revision lock until the caller's transaction ends.
    /// Snapshot fields the schema cannot store are dropped. Returns the new
    /// row id.
    pub async fn write(
        conn: &mut PgConnection,
        caps: &RevisionCapabilities,
        snapshot: &RevisionSnapshot,
        editor_id: Option<DbId>,
        note: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        let post_id = snapshot.post_id;
        Self::lock_history(conn, post_id).await?;

        let revision_number = if caps.revision_number {
            Some(Self::next_revision_number(conn, post_id).await?)
        } else {
            None
        };

        let columns = build_revision_insert(caps, snapshot, editor_id, revision_number, note);
        let query = render_insert(
            REVISION_TABLE,
            &columns,
            &[("created_at", "clock_timestamp()")],
            "id",
        );
        let (id,) = bind_columns(sqlx::query_as::<_, (DbId,)>(&query), &columns)
            .fetch_one(&mut *conn)
            .await?;

        tracing::debug!(post_id, revision_id = id, ?revision_number, "Revision recorded");
        Ok(id)
    }

    /// Serialize revision writes for one post until the transaction ends.
    async fn lock_history(conn: &mut PgConnection, post_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(REVISION_LOCK_NAMESPACE)
            .bind(revision_lock_key(post_id))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Next number for a post: highest stored number + 1, or row count + 1
    /// when no row carries a number yet.
    async fn next_revision_number(
        conn: &mut PgConnection,
        post_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let latest: Option<i32> = sqlx::query_scalar(
            "SELECT revision_number FROM post_revisions \
             WHERE post_id = $1 AND revision_number IS NOT NULL \
             ORDER BY revision_number DESC \
             LIMIT 1 \
             FOR UPDATE",
        )
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(latest) = latest {
            return Ok(latest + 1);
        }

        let count = Self::count_for_post(conn, post_id).await?;
        Ok(to_ordinal(count) + 1)
    }

    // ── Reader ───────────────────────────────────────────────────────

    /// List a post's revisions, newest first. Unknown posts yield an empty list.
    pub async fn list_by_post(
        pool: &PgPool,
        caps: &RevisionCapabilities,
        post_id: DbId,
    ) -> Result<Vec<RevisionSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM post_revisions r
             LEFT JOIN users u ON u.id = r.editor_id
             WHERE r.post_id = $1
             ORDER BY r.created_at DESC, r.id DESC",
            revision_summary_columns(caps)
        );
        let rows = sqlx::query_as::<_, RevisionSummaryRow>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await?;

        let persisted: Vec<Option<i32>> = rows.iter().map(|r| r.revision_number).collect();
        let numbers = list_ordinals(&persisted);

        Ok(rows
            .into_iter()
            .zip(numbers)
            .enumerate()
            .map(|(index, (row, number))| RevisionSummary::from_row(row, caps, number, index == 0))
            .collect())
    }

    /// Fetch one revision of a post with its computed position.
    ///
    /// Returns `None` if the revision does not exist or belongs to another post.
    pub async fn find_detail(
        pool: &PgPool,
        caps: &RevisionCapabilities,
        post_id: DbId,
        revision_id: DbId,
    ) -> Result<Option<RevisionDetail>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let Some(row) = Self::find_row(&mut conn, caps, post_id, revision_id, false).await? else {
            return Ok(None);
        };
        let position = Self::position_of(&mut conn, &row).await?;
        let total = Self::count_for_post(&mut conn, post_id).await?;

        Ok(Some(RevisionDetail::from_row(row, caps, position, total)))
    }

    /// Load a full revision row scoped to its post, optionally locking it
    /// `FOR UPDATE` for the rest of the transaction.
    pub async fn find_row(
        conn: &mut PgConnection,
        caps: &RevisionCapabilities,
        post_id: DbId,
        revision_id: DbId,
        lock: bool,
    ) -> Result<Option<RevisionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM post_revisions r
             LEFT JOIN users u ON u.id = r.editor_id
             WHERE r.post_id = $1 AND r.id = $2{}",
            revision_detail_columns(caps),
            if lock { " FOR UPDATE OF r" } else { "" }
        );
        sqlx::query_as::<_, RevisionRow>(&query)
            .bind(post_id)
            .bind(revision_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// 1-based position of a revision among its post's revisions.
    ///
    /// A stored number wins. Otherwise count rows created no later than this
    /// one (ties by id), and when the row has no usable timestamp, rows with a
    /// lower or equal id. Matches the numbers [`Self::list_by_post`] derives.
    pub async fn position_of(conn: &mut PgConnection, row: &RevisionRow) -> Result<i32, sqlx::Error> {
        if let Some(number) = valid_revision_number(row.revision_number) {
            return Ok(number);
        }

        if let Some(created_at) = row.created_at {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM post_revisions \
                 WHERE post_id = $1 \
                   AND (created_at < $2 OR (created_at = $2 AND id <= $3))",
            )
            .bind(row.post_id)
            .bind(created_at)
            .bind(row.id)
            .fetch_one(&mut *conn)
            .await?;
            if count > 0 {
                return Ok(to_ordinal(count));
            }
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_revisions WHERE post_id = $1 AND id <= $2")
                .bind(row.post_id)
                .bind(row.id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(to_ordinal(count))
    }

    /// Total number of revisions stored for a post.
    pub async fn count_for_post(conn: &mut PgConnection, post_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_revisions WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *conn)
            .await
    }
}

fn to_ordinal(count: i64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
