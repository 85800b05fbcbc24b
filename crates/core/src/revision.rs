//! Post revision snapshots and the schema-shaped SQL builders behind them.
//!
//! The `post_revisions` table has grown columns over time and not every
//! deployment has all of them. Everything in this module is driven by a
//! [`RevisionCapabilities`] descriptor resolved from the live schema, so the
//! repository layer never has to special-case a schema version:
//!
//! - [`build_revision_insert`] turns a sparse [`RevisionSnapshot`] into the
//!   ordered column/value list for an INSERT, dropping unsupported columns.
//! - [`build_record_update`] does the same for the live `posts` row.
//! - [`revision_detail_columns`] / [`revision_summary_columns`] render SELECT
//!   lists that substitute typed `NULL`s for missing columns, so row structs
//!   keep a fixed shape.
//! - [`list_ordinals`] derives revision numbers from insertion order when the
//!   numbering column is missing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// Revision history table.
pub const REVISION_TABLE: &str = "post_revisions";

/// Optional per-post sequence number column.
pub const REVISION_NUMBER_COLUMN: &str = "revision_number";

/// Advisory lock namespace used to serialize revision writes per post.
pub const REVISION_LOCK_NAMESPACE: i32 = 0x5245_5631;

// ---------------------------------------------------------------------------
// Tracked fields
// ---------------------------------------------------------------------------

/// SQL type family of a snapshot column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    Id,
    Number,
    Time,
}

impl FieldKind {
    /// PostgreSQL type used for typed `NULL` placeholders.
    pub const fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Flag => "boolean",
            FieldKind::Id => "bigint",
            FieldKind::Number => "integer",
            FieldKind::Time => "timestamptz",
        }
    }
}

/// An optional snapshot field. `content` is always present and is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    ContentMarkdown,
    Title,
    Excerpt,
    CoverImage,
    IsFeatured,
    AllowComments,
    Status,
    Slug,
    AuthorId,
    PublishedAt,
}

impl TrackedField {
    /// Every tracked field, in column order.
    pub const ALL: [TrackedField; 10] = [
        TrackedField::ContentMarkdown,
        TrackedField::Title,
        TrackedField::Excerpt,
        TrackedField::CoverImage,
        TrackedField::IsFeatured,
        TrackedField::AllowComments,
        TrackedField::Status,
        TrackedField::Slug,
        TrackedField::AuthorId,
        TrackedField::PublishedAt,
    ];

    /// Column name, identical on `posts` and `post_revisions`.
    pub const fn column(self) -> &'static str {
        match self {
            TrackedField::ContentMarkdown => "content_markdown",
            TrackedField::Title => "title",
            TrackedField::Excerpt => "excerpt",
            TrackedField::CoverImage => "cover_image",
            TrackedField::IsFeatured => "is_featured",
            TrackedField::AllowComments => "allow_comments",
            TrackedField::Status => "status",
            TrackedField::Slug => "slug",
            TrackedField::AuthorId => "author_id",
            TrackedField::PublishedAt => "published_at",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            TrackedField::ContentMarkdown
            | TrackedField::Title
            | TrackedField::Excerpt
            | TrackedField::CoverImage
            | TrackedField::Status
            | TrackedField::Slug => FieldKind::Text,
            TrackedField::IsFeatured | TrackedField::AllowComments => FieldKind::Flag,
            TrackedField::AuthorId => FieldKind::Id,
            TrackedField::PublishedAt => FieldKind::Time,
        }
    }

    /// Whether the live `posts` column is `NOT NULL`.
    pub const fn required_on_record(self) -> bool {
        matches!(
            self,
            TrackedField::Title
                | TrackedField::Slug
                | TrackedField::Status
                | TrackedField::IsFeatured
                | TrackedField::AllowComments
        )
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

/// A single bindable value. The inner `None` is SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(Option<String>),
    Flag(Option<bool>),
    Id(Option<DbId>),
    Number(Option<i32>),
    Time(Option<Timestamp>),
}

impl FieldValue {
    pub const fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::Id(_) => FieldKind::Id,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Time(_) => FieldKind::Time,
        }
    }

    pub const fn is_null(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Flag(v) => v.is_none(),
            FieldValue::Id(v) => v.is_none(),
            FieldValue::Number(v) => v.is_none(),
            FieldValue::Time(v) => v.is_none(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(Some(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(Some(v))
    }
}

impl From<Option<DbId>> for FieldValue {
    fn from(v: Option<DbId>) -> Self {
        FieldValue::Id(v)
    }
}

impl From<Option<Timestamp>> for FieldValue {
    fn from(v: Option<Timestamp>) -> Self {
        FieldValue::Time(v)
    }
}

// ---------------------------------------------------------------------------
// Capability descriptor
// ---------------------------------------------------------------------------

/// The two historical names of the diff summary column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSummaryColumn {
    /// Plain text note.
    ChangeSummary,
    /// JSON blob, `{"summary": "..."}` or a bare JSON string.
    DiffJson,
}

impl DiffSummaryColumn {
    pub const fn column(self) -> &'static str {
        match self {
            DiffSummaryColumn::ChangeSummary => "change_summary",
            DiffSummaryColumn::DiffJson => "diff_json",
        }
    }
}

/// SQL type of the diff summary column. Older deployments store `diff_json`
/// as `json` or `jsonb`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffNoteStorage {
    #[default]
    Text,
    Json,
    Jsonb,
}

impl DiffNoteStorage {
    /// Map an `information_schema.columns.data_type` value. Anything that is
    /// not JSON is written as text.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "json" => DiffNoteStorage::Json,
            "jsonb" => DiffNoteStorage::Jsonb,
            _ => DiffNoteStorage::Text,
        }
    }

    /// Cast applied to the bound text parameter on write.
    pub const fn placeholder_cast(self) -> Option<&'static str> {
        match self {
            DiffNoteStorage::Text => None,
            DiffNoteStorage::Json => Some("json"),
            DiffNoteStorage::Jsonb => Some("jsonb"),
        }
    }
}

/// Which optional `post_revisions` columns exist in the connected schema.
///
/// `Default` is the degraded descriptor: content-only history with derived
/// revision numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevisionCapabilities {
    pub revision_number: bool,
    pub content_markdown: bool,
    pub title: bool,
    pub excerpt: bool,
    pub cover_image: bool,
    pub is_featured: bool,
    pub allow_comments: bool,
    pub status: bool,
    pub slug: bool,
    pub author_id: bool,
    pub published_at: bool,
    pub diff_summary_column: Option<DiffSummaryColumn>,
    pub diff_note_storage: DiffNoteStorage,
}

impl RevisionCapabilities {
    /// Resolve a descriptor from the table's column names.
    ///
    /// When both diff summary columns exist, `change_summary` wins.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut caps = Self::default();
        let mut has_diff_json = false;
        for column in columns {
            let column = column.as_ref();
            match column {
                REVISION_NUMBER_COLUMN => caps.revision_number = true,
                "change_summary" => {
                    caps.diff_summary_column = Some(DiffSummaryColumn::ChangeSummary)
                }
                "diff_json" => has_diff_json = true,
                other => {
                    if let Some(field) = TrackedField::from_column(other) {
                        caps.set(field, true);
                    }
                }
            }
        }
        if caps.diff_summary_column.is_none() && has_diff_json {
            caps.diff_summary_column = Some(DiffSummaryColumn::DiffJson);
        }
        caps
    }

    /// Like [`Self::from_columns`], from `(column_name, data_type)` pairs, so
    /// the diff column's storage type is known too.
    pub fn from_typed_columns<I, S, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let columns: Vec<(S, T)> = columns.into_iter().collect();
        let mut caps = Self::from_columns(columns.iter().map(|(name, _)| name.as_ref()));
        if let Some(diff_column) = caps.diff_summary_column {
            caps.diff_note_storage = columns
                .iter()
                .find(|(name, _)| name.as_ref() == diff_column.column())
                .map(|(_, data_type)| DiffNoteStorage::from_data_type(data_type.as_ref()))
                .unwrap_or_default();
        }
        caps
    }

    /// Descriptor for a fully migrated schema.
    pub fn full() -> Self {
        let mut caps = Self {
            revision_number: true,
            diff_summary_column: Some(DiffSummaryColumn::ChangeSummary),
            ..Self::default()
        };
        for field in TrackedField::ALL {
            caps.set(field, true);
        }
        caps
    }

    pub const fn supports(&self, field: TrackedField) -> bool {
        match field {
            TrackedField::ContentMarkdown => self.content_markdown,
            TrackedField::Title => self.title,
            TrackedField::Excerpt => self.excerpt,
            TrackedField::CoverImage => self.cover_image,
            TrackedField::IsFeatured => self.is_featured,
            TrackedField::AllowComments => self.allow_comments,
            TrackedField::Status => self.status,
            TrackedField::Slug => self.slug,
            TrackedField::AuthorId => self.author_id,
            TrackedField::PublishedAt => self.published_at,
        }
    }

    pub fn set(&mut self, field: TrackedField, present: bool) {
        let flag = match field {
            TrackedField::ContentMarkdown => &mut self.content_markdown,
            TrackedField::Title => &mut self.title,
            TrackedField::Excerpt => &mut self.excerpt,
            TrackedField::CoverImage => &mut self.cover_image,
            TrackedField::IsFeatured => &mut self.is_featured,
            TrackedField::AllowComments => &mut self.allow_comments,
            TrackedField::Status => &mut self.status,
            TrackedField::Slug => &mut self.slug,
            TrackedField::AuthorId => &mut self.author_id,
            TrackedField::PublishedAt => &mut self.published_at,
        };
        *flag = present;
    }

    /// Tracked fields present in the schema, in column order.
    pub fn supported_fields(&self) -> impl Iterator<Item = TrackedField> + '_ {
        TrackedField::ALL.into_iter().filter(|f| self.supports(*f))
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A sparse snapshot of a post's editable fields.
///
/// A field that is absent was not captured; a field present with a `NULL`
/// value was captured as empty (e.g. a cleared cover image).
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionSnapshot {
    pub post_id: DbId,
    pub content: String,
    fields: BTreeMap<TrackedField, FieldValue>,
}

impl RevisionSnapshot {
    pub fn new(post_id: DbId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            content: content.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Carry `field` with `value`. The value kind must match `field.kind()`.
    pub fn with(mut self, field: TrackedField, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: TrackedField, value: impl Into<FieldValue>) {
        let value = value.into();
        debug_assert_eq!(value.kind(), field.kind(), "kind mismatch for {field:?}");
        self.fields.insert(field, value);
    }

    /// Carry a value read back from a stored revision.
    ///
    /// `NULL` in a field the live post requires means the row predates the
    /// column, so the field is treated as not captured.
    pub fn set_captured(&mut self, field: TrackedField, value: FieldValue) {
        if value.is_null() && field.required_on_record() {
            return;
        }
        self.set(field, value);
    }

    /// Stop carrying `field`, returning the value it had.
    pub fn forget(&mut self, field: TrackedField) -> Option<FieldValue> {
        self.fields.remove(&field)
    }

    pub fn get(&self, field: TrackedField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn carries(&self, field: TrackedField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (TrackedField, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    /// Copy of this snapshot without fields the schema cannot store.
    pub fn restricted_to(&self, caps: &RevisionCapabilities) -> Self {
        Self {
            post_id: self.post_id,
            content: self.content.clone(),
            fields: self
                .fields
                .iter()
                .filter(|(f, _)| caps.supports(**f))
                .map(|(f, v)| (*f, v.clone()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Statement builders
// ---------------------------------------------------------------------------

/// One `column = value` pair of a generated statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub column: &'static str,
    pub value: FieldValue,
    /// Type the text parameter is cast to in the rendered statement.
    pub cast: Option<&'static str>,
}

impl ColumnValue {
    fn new(column: &'static str, value: FieldValue) -> Self {
        Self {
            column,
            value,
            cast: None,
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self.cast {
            Some(cast) => format!("${index}::{cast}"),
            None => format!("${index}"),
        }
    }
}

/// Ordered column/value list for a new `post_revisions` row.
///
/// Unsupported snapshot fields are dropped silently. `revision_number` is
/// only included when the column exists and a number was computed; the diff
/// note only when a diff column exists.
pub fn build_revision_insert(
    caps: &RevisionCapabilities,
    snapshot: &RevisionSnapshot,
    editor_id: Option<DbId>,
    revision_number: Option<i32>,
    note: Option<&str>,
) -> Vec<ColumnValue> {
    let mut columns = vec![
        ColumnValue::new("post_id", FieldValue::Id(Some(snapshot.post_id))),
        ColumnValue::new("editor_id", FieldValue::Id(editor_id)),
        ColumnValue::new("content", FieldValue::Text(Some(snapshot.content.clone()))),
    ];

    if caps.revision_number {
        if let Some(number) = revision_number {
            columns.push(ColumnValue::new(
                REVISION_NUMBER_COLUMN,
                FieldValue::Number(Some(number)),
            ));
        }
    }

    for (field, value) in snapshot.fields() {
        if caps.supports(field) {
            columns.push(ColumnValue::new(field.column(), value.clone()));
        }
    }

    if let (Some(diff_column), Some(note)) = (caps.diff_summary_column, note) {
        columns.push(ColumnValue {
            cast: caps.diff_note_storage.placeholder_cast(),
            ..ColumnValue::new(
                diff_column.column(),
                FieldValue::Text(Some(encode_diff_note(diff_column, note))),
            )
        });
    }

    columns
}

/// Assignments applying a snapshot onto the live `posts` row.
///
/// Only declared fields are written; everything else keeps its current value.
pub fn build_record_update(snapshot: &RevisionSnapshot) -> Vec<ColumnValue> {
    let mut columns = vec![ColumnValue::new(
        "content",
        FieldValue::Text(Some(snapshot.content.clone())),
    )];
    columns.extend(
        snapshot
            .fields()
            .map(|(field, value)| ColumnValue::new(field.column(), value.clone())),
    );
    columns
}

/// Render an INSERT binding `columns` as `$1..$n`, followed by raw SQL
/// expressions (e.g. `("created_at", "clock_timestamp()")`).
pub fn render_insert(
    table: &str,
    columns: &[ColumnValue],
    raw: &[(&str, &str)],
    returning: &str,
) -> String {
    let names: Vec<&str> = columns
        .iter()
        .map(|c| c.column)
        .chain(raw.iter().map(|(name, _)| *name))
        .collect();
    let values: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| c.placeholder(i + 1))
        .chain(raw.iter().map(|(_, expr)| (*expr).to_string()))
        .collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING {returning}",
        names.join(", "),
        values.join(", ")
    )
}

/// Render an UPDATE of one row by id. Columns bind as `$1..$n`, the id as
/// `$n+1`.
pub fn render_update(
    table: &str,
    columns: &[ColumnValue],
    raw: &[(&str, &str)],
    returning: &str,
) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", c.column, c.placeholder(i + 1)))
        .chain(raw.iter().map(|(name, expr)| format!("{name} = {expr}")))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE id = ${} RETURNING {returning}",
        assignments.join(", "),
        columns.len() + 1
    )
}

fn optional_column(present: bool, column: &str, kind: FieldKind) -> String {
    if present {
        format!("r.{column}")
    } else {
        format!("NULL::{} AS {column}", kind.sql_type())
    }
}

fn diff_note_column(caps: &RevisionCapabilities) -> String {
    match caps.diff_summary_column {
        // `::text` reads json/jsonb storage too.
        Some(column) => format!("r.{}::text AS diff_note_raw", column.column()),
        None => "NULL::text AS diff_note_raw".to_string(),
    }
}

const EDITOR_NAME_COLUMN: &str = "COALESCE(u.display_name, u.username) AS editor_name";

/// SELECT list for list views. Expects `post_revisions r LEFT JOIN users u`.
pub fn revision_summary_columns(caps: &RevisionCapabilities) -> String {
    [
        "r.id".to_string(),
        "r.post_id".to_string(),
        "r.editor_id".to_string(),
        EDITOR_NAME_COLUMN.to_string(),
        "r.created_at".to_string(),
        optional_column(caps.revision_number, REVISION_NUMBER_COLUMN, FieldKind::Number),
        diff_note_column(caps),
    ]
    .join(", ")
}

/// SELECT list with every snapshot column. Missing columns read as `NULL`.
pub fn revision_detail_columns(caps: &RevisionCapabilities) -> String {
    let mut columns = vec![revision_summary_columns(caps), "r.content".to_string()];
    columns.extend(
        TrackedField::ALL
            .into_iter()
            .map(|f| optional_column(caps.supports(f), f.column(), f.kind())),
    );
    columns.join(", ")
}

// ---------------------------------------------------------------------------
// Ordinals
// ---------------------------------------------------------------------------

/// A stored revision number is usable only when it is positive.
pub fn valid_revision_number(number: Option<i32>) -> Option<i32> {
    number.filter(|n| *n > 0)
}

/// Revision numbers for a newest-first listing.
///
/// Stored numbers win; rows without one get their position, `len` for the
/// newest down to `1` for the oldest.
pub fn list_ordinals(persisted: &[Option<i32>]) -> Vec<i32> {
    let total = persisted.len();
    persisted
        .iter()
        .enumerate()
        .map(|(index, number)| {
            valid_revision_number(*number)
                .unwrap_or_else(|| i32::try_from(total - index).unwrap_or(i32::MAX))
        })
        .collect()
}

/// Second key for the per-post advisory lock.
///
/// Ids beyond `i32::MAX` fold onto smaller keys, which only adds contention.
pub fn revision_lock_key(post_id: DbId) -> i32 {
    i32::try_from(post_id & i64::from(i32::MAX)).unwrap_or_default()
}

/// Note recorded on the revision produced by a restore.
pub fn restore_note(restored_position: i32) -> String {
    format!("Restored from revision {restored_position}")
}

// ---------------------------------------------------------------------------
// Diff note codec
// ---------------------------------------------------------------------------

/// Encode a note for storage in `column`.
pub fn encode_diff_note(column: DiffSummaryColumn, note: &str) -> String {
    match column {
        DiffSummaryColumn::ChangeSummary => note.to_string(),
        DiffSummaryColumn::DiffJson => serde_json::json!({ "summary": note }).to_string(),
    }
}

/// Decode a stored note. Blank or unparseable values read as `None`.
pub fn decode_diff_note(column: Option<DiffSummaryColumn>, raw: Option<&str>) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let note = match column? {
        DiffSummaryColumn::ChangeSummary => raw.to_string(),
        DiffSummaryColumn::DiffJson => match serde_json::from_str::<serde_json::Value>(raw).ok()? {
            serde_json::Value::String(s) => s,
            serde_json::Value::Object(map) => map.get("summary")?.as_str()?.to_string(),
            _ => return None,
        },
    };
    Some(note).filter(|n| !n.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
