//! Domain types and pure logic shared by the database and API crates.
//!
//! Nothing in this crate performs I/O, so every builder and validator here
//! can be unit tested without a database.

pub mod error;
pub mod post;
pub mod revision;
pub mod types;
