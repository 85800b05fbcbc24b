//! Post entity model and DTOs.

use quill_core::revision::{RevisionSnapshot, TrackedField};
use quill_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub content_markdown: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub is_featured: bool,
    pub allow_comments: bool,
    pub status: String,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Post {
    /// Snapshot of every tracked field in the post's current state.
    pub fn snapshot(&self) -> RevisionSnapshot {
        RevisionSnapshot::new(self.id, self.content.clone())
            .with(TrackedField::ContentMarkdown, self.content_markdown.clone())
            .with(TrackedField::Title, self.title.clone())
            .with(TrackedField::Excerpt, self.excerpt.clone())
            .with(TrackedField::CoverImage, self.cover_image.clone())
            .with(TrackedField::IsFeatured, self.is_featured)
            .with(TrackedField::AllowComments, self.allow_comments)
            .with(TrackedField::Status, self.status.clone())
            .with(TrackedField::Slug, self.slug.clone())
            .with(TrackedField::AuthorId, self.author_id)
            .with(TrackedField::PublishedAt, self.published_at)
    }
}

/// DTO for creating a new post. The slug is derived from the title when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub content_markdown: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub is_featured: Option<bool>,
    pub allow_comments: Option<bool>,
    pub status: Option<String>,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub change_summary: Option<String>,
}

/// DTO for updating a post. All fields optional; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub content_markdown: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub is_featured: Option<bool>,
    pub allow_comments: Option<bool>,
    pub status: Option<String>,
    pub author_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub change_summary: Option<String>,
}

impl UpdatePost {
    /// Snapshot of only the fields this update writes, on top of `current`'s
    /// content.
    pub fn changes(&self, current: &Post) -> RevisionSnapshot {
        let content = self
            .content
            .clone()
            .unwrap_or_else(|| current.content.clone());
        let mut snapshot = RevisionSnapshot::new(current.id, content);

        if let Some(v) = &self.content_markdown {
            snapshot.set(TrackedField::ContentMarkdown, v.as_str());
        }
        if let Some(v) = &self.title {
            snapshot.set(TrackedField::Title, v.as_str());
        }
        if let Some(v) = &self.excerpt {
            snapshot.set(TrackedField::Excerpt, v.as_str());
        }
        if let Some(v) = &self.cover_image {
            snapshot.set(TrackedField::CoverImage, v.as_str());
        }
        if let Some(v) = self.is_featured {
            snapshot.set(TrackedField::IsFeatured, v);
        }
        if let Some(v) = self.allow_comments {
            snapshot.set(TrackedField::AllowComments, v);
        }
        if let Some(v) = &self.status {
            snapshot.set(TrackedField::Status, v.as_str());
        }
        if let Some(v) = &self.slug {
            snapshot.set(TrackedField::Slug, v.as_str());
        }
        if self.author_id.is_some() {
            snapshot.set(TrackedField::AuthorId, self.author_id);
        }
        if self.published_at.is_some() {
            snapshot.set(TrackedField::PublishedAt, self.published_at);
        }
        snapshot
    }

    /// True when the update writes no post field (a bare `change_summary`
    /// does not count).
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.content.is_none()
            && self.content_markdown.is_none()
            && self.excerpt.is_none()
            && self.cover_image.is_none()
            && self.is_featured.is_none()
            && self.allow_comments.is_none()
            && self.status.is_none()
            && self.author_id.is_none()
            && self.published_at.is_none()
    }
}

/// Result of a successful restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoredPost {
    /// The live post after the restored fields were applied.
    pub post: Post,
    /// The revision that was restored from.
    pub restored_from: DbId,
    /// The new revision recording the restore.
    pub revision_id: DbId,
}
