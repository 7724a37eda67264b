//! Postgres-backed repository implementations.

mod accounts;
mod collaborations;
mod comments;
mod forums;
mod jobs;
mod likes;
mod news;
mod products;
mod reference;
mod tokens;
mod util;

pub use util::{contains_pattern, map_sqlx_error};

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{ListQuery, PageRequest, Sort};
use crate::application::repos::{HealthRepo, RepoError};
use crate::domain::entities::PosterSummary;

const LIKE_ESCAPE: &str = " ESCAPE '\\'";

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

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// `AND (a ILIKE $n OR b ILIKE $n ...)` over the given qualified columns. The term is
    /// matched as a literal substring.
    fn push_search<'q>(qb: &mut QueryBuilder<'q, Postgres>, columns: &[&str], term: Option<&str>) {
        let Some(term) = term else {
            return;
        };
        let pattern = contains_pattern(term);
        qb.push(" AND (");
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                qb.push(" OR ");
            }
            qb.push(*column);
            qb.push(" ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(LIKE_ESCAPE);
        }
        qb.push(")");
    }

    /// Order by an allow-listed column with `id` as tie-breaker, then limit/offset.
    fn push_page<'q>(
        qb: &mut QueryBuilder<'q, Postgres>,
        alias: &str,
        sort: Sort,
        page: PageRequest,
    ) {
        qb.push(format!(
            " ORDER BY {alias}.{field} {order}, {alias}.id {order}",
            field = sort.field,
            order = sort.order.as_sql()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());
    }

    async fn count(mut qb: QueryBuilder<'_, Postgres>, pool: &PgPool) -> Result<u64, RepoError> {
        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(total)
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
        self.health_check().await.map_err(map_sqlx_error)
    }
}

/// Columns selected for the author of a posted resource, joined as `u`.
const POSTER_COLUMNS: &str =
    "u.name AS poster_name, u.email AS poster_email, u.profile_picture_url AS poster_picture";

/// Poster fields shared by every posted-resource row.
#[derive(sqlx::FromRow)]
struct PosterColumns {
    poster_name: String,
    poster_email: String,
    poster_picture: Option<String>,
}

impl PosterColumns {
    fn summary(self, id: Uuid) -> PosterSummary {
        PosterSummary {
            id,
            name: self.poster_name,
            email: Some(self.poster_email),
            profile_picture_url: self.poster_picture,
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Page query pair sharing one WHERE clause: `(rows, count)`.
fn list_builders<F>(
    select: &str,
    from: &str,
    query: &ListQuery<F>,
    push_where: impl Fn(&mut QueryBuilder<'static, Postgres>, &ListQuery<F>),
) -> (QueryBuilder<'static, Postgres>, QueryBuilder<'static, Postgres>) {
    let mut rows = QueryBuilder::new(format!("SELECT {select} FROM {from} WHERE TRUE"));
    push_where(&mut rows, query);
    let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {from} WHERE TRUE"));
    push_where(&mut count, query);
    (rows, count)
}
