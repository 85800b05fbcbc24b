//! Post revision models.
//!
//! Revisions are immutable snapshots of a post, created on every content
//! change and on every restore. Row structs have a fixed shape: columns the
//! connected schema lacks are selected as typed `NULL`s (see
//! `quill_core::revision::revision_detail_columns`).

use quill_core::revision::{
    decode_diff_note, FieldValue, RevisionCapabilities, RevisionSnapshot, TrackedField,
};
use quill_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Summary columns of a `post_revisions` row joined with its editor.
#[derive(Debug, Clone, FromRow)]
pub struct RevisionSummaryRow {
    pub id: DbId,
    pub post_id: DbId,
    pub editor_id: Option<DbId>,
    pub editor_name: Option<String>,
    pub created_at: Option<Timestamp>,
    pub revision_number: Option<i32>,
    pub diff_note_raw: Option<String>,
}

/// A full `post_revisions` row joined with its editor.
#[derive(Debug, Clone, FromRow)]
pub struct RevisionRow {
    pub id: DbId,
    pub post_id: DbId,
    pub editor_id: Option<DbId>,
    pub editor_name: Option<String>,
    pub created_at: Option<Timestamp>,
    pub revision_number: Option<i32>,
    pub diff_note_raw: Option<String>,
    pub content: String,
    pub content_markdown: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub is_featured: Option<bool>,
    pub allow_comments: Option<bool>,
    pub status: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
}

impl RevisionRow {
    fn value_of(&self, field: TrackedField) -> FieldValue {
        match field {
            TrackedField::ContentMarkdown => FieldValue::Text(self.content_markdown.clone()),
            TrackedField::Title => FieldValue::Text(self.title.clone()),
            TrackedField::Excerpt => FieldValue::Text(self.excerpt.clone()),
            TrackedField::CoverImage => FieldValue::Text(self.cover_image.clone()),
            TrackedField::IsFeatured => FieldValue::Flag(self.is_featured),
            TrackedField::AllowComments => FieldValue::Flag(self.allow_comments),
            TrackedField::Status => FieldValue::Text(self.status.clone()),
            TrackedField::Slug => FieldValue::Text(self.slug.clone()),
            TrackedField::AuthorId => FieldValue::Id(self.author_id),
            TrackedField::PublishedAt => FieldValue::Time(self.published_at),
        }
    }

    /// Rebuild the stored snapshot, carrying only columns the schema has.
    pub fn to_snapshot(&self, caps: &RevisionCapabilities) -> RevisionSnapshot {
        let mut snapshot = RevisionSnapshot::new(self.post_id, self.content.clone());
        for field in caps.supported_fields() {
            snapshot.set_captured(field, self.value_of(field));
        }
        snapshot
    }
}

/// One entry of a post's revision list.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionSummary {
    pub id: DbId,
    pub post_id: DbId,
    /// Stored number, or the position derived from insertion order.
    pub revision_number: i32,
    pub is_latest: bool,
    pub editor_id: Option<DbId>,
    pub editor_name: Option<String>,
    pub diff_summary: Option<String>,
    pub created_at: Option<Timestamp>,
}

impl RevisionSummary {
    pub fn from_row(
        row: RevisionSummaryRow,
        caps: &RevisionCapabilities,
        revision_number: i32,
        is_latest: bool,
    ) -> Self {
        Self {
            diff_summary: decode_diff_note(caps.diff_summary_column, row.diff_note_raw.as_deref()),
            id: row.id,
            post_id: row.post_id,
            revision_number,
            is_latest,
            editor_id: row.editor_id,
            editor_name: row.editor_name,
            created_at: row.created_at,
        }
    }
}

/// Full content of one revision plus its computed position.
///
/// Snapshot fields the schema does not track serialize as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionDetail {
    pub id: DbId,
    pub post_id: DbId,
    /// 1-based position among the post's revisions, oldest first.
    pub revision_number: i32,
    pub is_latest: bool,
    pub total_revisions: i64,
    pub editor_id: Option<DbId>,
    pub editor_name: Option<String>,
    pub diff_summary: Option<String>,
    pub created_at: Option<Timestamp>,
    pub content: String,
    pub content_markdown: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub is_featured: Option<bool>,
    pub allow_comments: Option<bool>,
    pub status: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
}

impl RevisionDetail {
    pub fn from_row(
        row: RevisionRow,
        caps: &RevisionCapabilities,
        position: i32,
        total_revisions: i64,
    ) -> Self {
        Self {
            diff_summary: decode_diff_note(caps.diff_summary_column, row.diff_note_raw.as_deref()),
            is_latest: i64::from(position) == total_revisions,
            id: row.id,
            post_id: row.post_id,
            revision_number: position,
            total_revisions,
            editor_id: row.editor_id,
            editor_name: row.editor_name,
            created_at: row.created_at,
            content: row.content,
            content_markdown: row.content_markdown,
            title: row.title,
            excerpt: row.excerpt,
            cover_image: row.cover_image,
            is_featured: row.is_featured,
            allow_comments: row.allow_comments,
            status: row.status,
            slug: row.slug,
            author_id: row.author_id,
            published_at: row.published_at,
        }
    }
}
