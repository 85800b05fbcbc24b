pub mod post;
pub mod revision;
