use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::pagination::{ListFilter, ListQuery};
use crate::application::repos::{
    CreatePostParams, ListStore, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::views::{PostStats, PostView, UserSummary};

use super::{ListSource, PostgresRepositories, map_sqlx_error};

const POSTS: ListSource = ListSource {
    table: "posts",
    alias: "p",
    owner_column: Some("user_id"),
};

const POST_VIEW_SELECT: &str = "SELECT p.id, p.captions, p.user_id, p.created_at, p.updated_at, \
     u.name AS author_name, u.email AS author_email, \
     (SELECT COUNT(*) FROM saved_posts sc WHERE sc.post_id = p.id) AS save_count \
     FROM posts p INNER JOIN users u ON u.id = p.user_id WHERE 1=1";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    captions: String,
    user_id: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            captions: row.captions,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    id: i64,
    captions: String,
    user_id: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_name: String,
    author_email: String,
    save_count: i64,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let author = UserSummary {
            id: row.user_id,
            name: row.author_name,
            email: row.author_email,
        };
        PostView::new(
            PostRecord {
                id: row.id,
                captions: row.captions,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
            row.save_count,
        )
    }
}

#[async_trait]
impl ListStore<PostView> for PostgresRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<PostView>, RepoError> {
        let mut qb = QueryBuilder::new(POST_VIEW_SELECT);
        POSTS.apply_filter(&mut qb, &query.filter)?;
        if let Some(bound) = &query.after {
            POSTS.apply_cursor(&mut qb, query.sort, bound);
        }
        POSTS.apply_window(&mut qb, query);

        let rows = qb
            .build_query_as::<PostViewRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1");
        POSTS.apply_filter(&mut qb, filter)?;

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, captions, user_id, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_post_view(&self, id: i64) -> Result<Option<PostView>, RepoError> {
        let mut qb = QueryBuilder::new(POST_VIEW_SELECT);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostViewRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostView::from))
    }

    async fn post_stats(&self, owner_id: i64) -> Result<PostStats, RepoError> {
        let (total_posts, total_saves): (i64, i64) = sqlx::query_as(
            "SELECT \
                 (SELECT COUNT(*) FROM posts WHERE user_id = $1), \
                 (SELECT COUNT(*) FROM saved_posts s \
                  INNER JOIN posts p ON p.id = s.post_id WHERE p.user_id = $1)",
        )
        .bind(owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostStats {
            total_posts: Self::convert_count(total_posts)?,
            total_saves: Self::convert_count(total_saves)?,
        })
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (user_id, captions) VALUES ($1, $2) \
             RETURNING id, captions, user_id, created_at, updated_at",
        )
        .bind(params.user_id)
        .bind(params.captions)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET captions = $2, updated_at = now() WHERE id = $1 \
             RETURNING id, captions, user_id, created_at, updated_at",
        )
        .bind(params.id)
        .bind(params.captions)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM saved_posts WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
