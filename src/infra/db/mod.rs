//! Postgres-backed repository implementations.

mod posts;
mod saved_posts;
mod sessions;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use std::time::Duration;

use sqlx::{
    Postgres, QueryBuilder, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::pagination::{
    CursorBound, CursorValue, ListFilter, ListQuery, Sort, SortDirection, SortKey,
};
use crate::application::repos::{HealthRepo, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

/// Table a listing reads from, and how its filters map onto columns.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListSource {
    pub(crate) table: &'static str,
    pub(crate) alias: &'static str,
    pub(crate) owner_column: Option<&'static str>,
}

impl ListSource {
    /// Append ` AND ...` conditions for `filter`. Expects a preceding `WHERE 1=1`.
    pub(crate) fn apply_filter(
        &self,
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &ListFilter,
    ) -> Result<(), RepoError> {
        if let Some(owner_id) = filter.owner_id {
            let Some(column) = self.owner_column else {
                return Err(RepoError::InvalidInput {
                    message: format!("`{}` listings have no owner filter", self.table),
                });
            };
            qb.push(format!(" AND {}.{} = ", self.alias, column));
            qb.push_bind(owner_id);
        }

        if let Some(search) = filter.search.as_ref().filter(|s| !s.fields.is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.term));
            qb.push(" AND (");
            for (idx, field) in search.fields.iter().enumerate() {
                if idx > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("{}.{} ILIKE ", self.alias, field.column()));
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\'");
            }
            qb.push(")");
        }

        Ok(())
    }

    /// Keyset condition: rows strictly after the row whose cursor field matches.
    ///
    /// An unknown cursor row makes the sub-select `NULL`, which matches nothing.
    pub(crate) fn apply_cursor(
        &self,
        qb: &mut QueryBuilder<'_, Postgres>,
        sort: Sort,
        bound: &CursorBound,
    ) {
        let op = match sort.direction {
            SortDirection::Desc => "<",
            SortDirection::Asc => ">",
        };
        let alias = self.alias;
        let columns = match sort.key {
            SortKey::CreatedAt => "created_at, id",
            SortKey::Id => "id",
        };
        let outer = match sort.key {
            SortKey::CreatedAt => format!("({alias}.created_at, {alias}.id)"),
            SortKey::Id => format!("{alias}.id"),
        };

        qb.push(format!(
            " AND {outer} {op} (SELECT {columns} FROM {} c WHERE c.{} = ",
            self.table,
            bound.field.as_str()
        ));
        match &bound.value {
            CursorValue::Int(value) => qb.push_bind(*value),
            CursorValue::Text(value) => qb.push_bind(value.clone()),
        };
        qb.push(")");
    }

    /// `ORDER BY` with `id` as tie-breaker, then `LIMIT`/`OFFSET`.
    pub(crate) fn apply_window(&self, qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
        let direction = match query.sort.direction {
            SortDirection::Desc => "DESC",
            SortDirection::Asc => "ASC",
        };
        let alias = self.alias;
        match query.sort.key {
            SortKey::CreatedAt => qb.push(format!(
                " ORDER BY {alias}.created_at {direction}, {alias}.id {direction}"
            )),
            SortKey::Id => qb.push(format!(" ORDER BY {alias}.id {direction}")),
        };

        qb.push(" LIMIT ");
        qb.push_bind(i64::from(query.take));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
    }
}

/// Escape `LIKE` metacharacters so search terms match literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
