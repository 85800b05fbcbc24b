//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or a connection borrowed from an open transaction) as the first
//! argument.

pub mod post_repo;
pub mod revision_repo;

pub use post_repo::PostRepo;
pub use revision_repo::RevisionRepo;
