//! Post status constants, slug generation and input validation.
//!
//! Shared by the repository layer (which snapshots posts into revisions) and
//! the API handlers (which validate incoming edits before they reach the
//! database).

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_ARCHIVED: &str = "archived";

/// All valid post statuses.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_PUBLISHED,
    STATUS_SCHEDULED,
    STATUS_ARCHIVED,
];

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum excerpt length in characters.
pub const MAX_EXCERPT_LEN: usize = 500;

/// Maximum rendered content length in bytes.
pub const MAX_CONTENT_LEN: usize = 500_000;

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a post title.
///
/// Lowercases, maps every non-alphanumeric character to a hyphen, collapses
/// runs of hyphens and trims them from both ends.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }
    result.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a post title (non-empty, at most [`MAX_TITLE_LEN`] chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a post slug (non-empty, lowercase alphanumeric and hyphens only).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

/// Validate a post status against [`VALID_STATUSES`].
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if !VALID_STATUSES.contains(&status) {
        return Err(CoreError::Validation(format!(
            "Invalid status '{}'. Valid statuses: {}",
            status,
            VALID_STATUSES.join(", ")
        )));
    }
    Ok(())
}

/// Validate rendered post content (non-empty, at most [`MAX_CONTENT_LEN`] bytes).
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("Content must not be empty".into()));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err(CoreError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LEN} bytes"
        )));
    }
    Ok(())
}

/// Validate a post excerpt (at most [`MAX_EXCERPT_LEN`] chars).
pub fn validate_excerpt(excerpt: &str) -> Result<(), CoreError> {
    if excerpt.chars().count() > MAX_EXCERPT_LEN {
        return Err(CoreError::Validation(format!(
            "Excerpt must be at most {MAX_EXCERPT_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
