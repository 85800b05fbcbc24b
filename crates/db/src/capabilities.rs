//! Runtime detection of which optional `post_revisions` columns exist.
//!
//! The revision table has been extended incrementally and environments are
//! migrated at different times, so the repositories never assume a column
//! exists. The schema is probed once per service and the result is shared by
//! every request for the rest of the process.

use std::sync::atomic::{AtomicUsize, Ordering};

use quill_core::revision::{RevisionCapabilities, REVISION_TABLE};
use sqlx::PgPool;
use tokio::sync::OnceCell;

/// Lazily resolved, process-wide [`RevisionCapabilities`].
///
/// Concurrent callers that arrive before the first probe finishes all await
/// that same probe. A failed probe resolves to the default (content-only)
/// descriptor and is cached like any other result.
pub struct RevisionCapabilityService {
    pool: Option<PgPool>,
    resolved: OnceCell<RevisionCapabilities>,
    probes: AtomicUsize,
}

impl RevisionCapabilityService {
    /// Service that probes `pool` on first use.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Some(pool),
            resolved: OnceCell::new(),
            probes: AtomicUsize::new(0),
        }
    }

    /// Service pre-seeded with a known descriptor. Never touches a database.
    pub fn fixed(capabilities: RevisionCapabilities) -> Self {
        Self {
            pool: None,
            resolved: OnceCell::new_with(Some(capabilities)),
            probes: AtomicUsize::new(0),
        }
    }

    /// Resolve the descriptor, probing the schema on the first call only.
    pub async fn get(&self) -> RevisionCapabilities {
        *self.resolved.get_or_init(|| self.probe()).await
    }

    /// Number of schema probes issued so far (0 or 1).
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    async fn probe(&self) -> RevisionCapabilities {
        self.probes.fetch_add(1, Ordering::SeqCst);

        let Some(pool) = &self.pool else {
            return RevisionCapabilities::default();
        };

        match fetch_revision_columns(pool).await {
            Ok(columns) if columns.is_empty() => {
                tracing::warn!(
                    table = REVISION_TABLE,
                    "No column metadata for revision table, using content-only history"
                );
                RevisionCapabilities::default()
            }
            Ok(columns) => {
                let capabilities = RevisionCapabilities::from_typed_columns(columns);
                tracing::info!(?capabilities, "Resolved revision table capabilities");
                capabilities
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    table = REVISION_TABLE,
                    "Revision schema probe failed, using content-only history"
                );
                RevisionCapabilities::default()
            }
        }
    }
}

/// `(column_name, data_type)` of every column of the revision table in the
/// connection's current schema.
pub async fn fetch_revision_columns(pool: &PgPool) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT column_name::text, data_type::text
         FROM information_schema.columns
         WHERE table_schema = current_schema()
           AND table_name = $1
         ORDER BY ordinal_position",
    )
    .bind(REVISION_TABLE)
    .fetch_all(pool)
    .await
}
