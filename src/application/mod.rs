//! Application services layer.

pub mod error;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod saved_posts;
pub mod sessions;
pub mod users;
