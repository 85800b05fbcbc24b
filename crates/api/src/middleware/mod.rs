//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated editor from a JWT Bearer token.

pub mod auth;
