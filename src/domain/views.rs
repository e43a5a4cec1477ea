//! Read models assembled from joined rows and returned by list endpoints.
//!
//! Every view here is also what gets serialized into the cache, so the
//! types round-trip through JSON without loss.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::entities::{PostRecord, UserRecord};

/// Public projection of a user embedded in post payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A post together with its author and the number of users who saved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub captions: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user: UserSummary,
    pub save_count: i64,
}

impl PostView {
    pub fn new(post: PostRecord, author: UserSummary, save_count: i64) -> Self {
        Self {
            id: post.id,
            captions: post.captions,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            user: author,
            save_count,
        }
    }
}

/// A saved-post bookmark with the bookmarked post embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostView {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub post: PostView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub total_posts: u64,
    pub total_saves: u64,
}
