//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{ListFilter, ListQuery, PaginationError};
use crate::domain::entities::{PostRecord, SavedPostRecord, UserRecord};
use crate::domain::views::{PostStats, PostView, SavedPostView};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Generic listing access used by the pagination engine.
#[async_trait]
pub trait ListStore<T: Send>: Send + Sync {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<T>, RepoError>;

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: i64,
    pub captions: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub captions: String,
}

#[async_trait]
pub trait PostsRepo: ListStore<PostView> {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn find_post_view(&self, id: i64) -> Result<Option<PostView>, RepoError>;

    /// Number of posts owned by `owner_id` and saves received across them.
    async fn post_stats(&self, owner_id: i64) -> Result<PostStats, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Deletes the post and every bookmark pointing at it.
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SavedPostsRepo: ListStore<SavedPostView> {
    async fn find_saved(&self, id: i64) -> Result<Option<SavedPostRecord>, RepoError>;

    async fn find_saved_for(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<Option<SavedPostRecord>, RepoError>;

    async fn create_saved(&self, user_id: i64, post_id: i64)
    -> Result<SavedPostRecord, RepoError>;

    async fn delete_saved(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: ListStore<UserRecord> {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;
}

/// Resolves hashed session tokens issued by the authentication service.
#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn find_session_user(&self, token_hash: &[u8]) -> Result<Option<i64>, RepoError>;
}

/// Liveness check for the primary store.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
