use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::pagination::{ListFilter, ListQuery};
use crate::application::repos::{ListStore, RepoError, SavedPostsRepo};
use crate::domain::entities::{PostRecord, SavedPostRecord};
use crate::domain::views::{PostView, SavedPostView, UserSummary};

use super::{ListSource, PostgresRepositories, map_sqlx_error};

const SAVED_POSTS: ListSource = ListSource {
    table: "saved_posts",
    alias: "s",
    owner_column: Some("user_id"),
};

const SAVED_VIEW_SELECT: &str = "SELECT s.id, s.user_id, s.post_id, s.created_at, \
     p.captions, p.user_id AS post_user_id, p.created_at AS post_created_at, \
     p.updated_at AS post_updated_at, u.name AS author_name, u.email AS author_email, \
     (SELECT COUNT(*) FROM saved_posts sc WHERE sc.post_id = p.id) AS save_count \
     FROM saved_posts s \
     INNER JOIN posts p ON p.id = s.post_id \
     INNER JOIN users u ON u.id = p.user_id WHERE 1=1";

#[derive(sqlx::FromRow)]
struct SavedPostRow {
    id: i64,
    user_id: i64,
    post_id: i64,
    created_at: OffsetDateTime,
}

impl From<SavedPostRow> for SavedPostRecord {
    fn from(row: SavedPostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SavedPostViewRow {
    id: i64,
    user_id: i64,
    post_id: i64,
    created_at: OffsetDateTime,
    captions: String,
    post_user_id: i64,
    post_created_at: OffsetDateTime,
    post_updated_at: OffsetDateTime,
    author_name: String,
    author_email: String,
    save_count: i64,
}

impl From<SavedPostViewRow> for SavedPostView {
    fn from(row: SavedPostViewRow) -> Self {
        let post = PostView::new(
            PostRecord {
                id: row.post_id,
                captions: row.captions,
                user_id: row.post_user_id,
                created_at: row.post_created_at,
                updated_at: row.post_updated_at,
            },
            UserSummary {
                id: row.post_user_id,
                name: row.author_name,
                email: row.author_email,
            },
            row.save_count,
        );
        Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            created_at: row.created_at,
            post,
        }
    }
}

#[async_trait]
impl ListStore<SavedPostView> for PostgresRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<SavedPostView>, RepoError> {
        let mut qb = QueryBuilder::new(SAVED_VIEW_SELECT);
        SAVED_POSTS.apply_filter(&mut qb, &query.filter)?;
        if let Some(bound) = &query.after {
            SAVED_POSTS.apply_cursor(&mut qb, query.sort, bound);
        }
        SAVED_POSTS.apply_window(&mut qb, query);

        let rows = qb
            .build_query_as::<SavedPostViewRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SavedPostView::from).collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM saved_posts s WHERE 1=1");
        SAVED_POSTS.apply_filter(&mut qb, filter)?;

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl SavedPostsRepo for PostgresRepositories {
    async fn find_saved(&self, id: i64) -> Result<Option<SavedPostRecord>, RepoError> {
        let row = sqlx::query_as::<_, SavedPostRow>(
            "SELECT id, user_id, post_id, created_at FROM saved_posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SavedPostRecord::from))
    }

    async fn find_saved_for(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<Option<SavedPostRecord>, RepoError> {
        let row = sqlx::query_as::<_, SavedPostRow>(
            "SELECT id, user_id, post_id, created_at FROM saved_posts \
             WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SavedPostRecord::from))
    }

    async fn create_saved(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<SavedPostRecord, RepoError> {
        let row = sqlx::query_as::<_, SavedPostRow>(
            "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) \
             RETURNING id, user_id, post_id, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_saved(&self, id: i64) -> Result<(), RepoError> {
        let deleted = sqlx::query("DELETE FROM saved_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
