use std::sync::Arc;

use quill_db::capabilities::RevisionCapabilityService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: quill_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Which optional revision columns the connected schema has. Probed on
    /// first use and shared by every request afterwards.
    pub revision_capabilities: Arc<RevisionCapabilityService>,
}
