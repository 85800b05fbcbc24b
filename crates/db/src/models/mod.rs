//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Serialize` response types handed to the API layer
//! - `Deserialize` DTOs for inserts and patches where the entity is writable

pub mod post;
pub mod revision;
