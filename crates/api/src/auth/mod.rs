//! Authentication primitives.
//!
//! - [`jwt`] -- editor access tokens. The token's subject is recorded as the
//!   editor of every revision.

pub mod jwt;
