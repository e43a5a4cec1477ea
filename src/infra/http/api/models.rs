use serde::{Deserialize, Serialize};

use crate::cache::{Source, Sourced};

/// Success envelope shared by every API route.
///
/// `source` is present on cached reads and tells the caller whether the
/// payload came from the cache or the database.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn sourced(message: &'static str, sourced: Sourced<T>) -> Self {
        Self {
            message,
            source: Some(sourced.source),
            data: sourced.value,
        }
    }

    pub fn plain(message: &'static str, data: T) -> Self {
        Self {
            message,
            source: None,
            data,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePostRequest {
    pub captions: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdatePostRequest {
    pub captions: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePostRequest {
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub database: &'static str,
    pub cache: &'static str,
}
