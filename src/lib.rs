//! Social feed backend: paginated post, saved-post and user listings served
//! through a read-through cache that is invalidated on every mutation.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
