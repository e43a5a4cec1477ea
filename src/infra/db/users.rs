use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::pagination::{ListFilter, ListQuery};
use crate::application::repos::{ListStore, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

use super::{ListSource, PostgresRepositories, map_sqlx_error};

const USERS: ListSource = ListSource {
    table: "users",
    alias: "u",
    owner_column: None,
};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ListStore<UserRecord> for PostgresRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT u.id, u.name, u.email, u.created_at, u.updated_at FROM users u WHERE 1=1",
        );
        USERS.apply_filter(&mut qb, &query.filter)?;
        if let Some(bound) = &query.after {
            USERS.apply_cursor(&mut qb, query.sort, bound);
        }
        USERS.apply_window(&mut qb, query);

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users u WHERE 1=1");
        USERS.apply_filter(&mut qb, filter)?;

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }
}
