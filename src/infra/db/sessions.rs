use async_trait::async_trait;

use crate::application::repos::{RepoError, SessionsRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn find_session_user(&self, token_hash: &[u8]) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM sessions WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
