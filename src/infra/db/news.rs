use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{News, NewsDraft, NewsFilter, NewsPatch},
    domain::entities::NewsRecord,
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, list_builders, map_sqlx_error, now};

const NEWS_FROM: &str = "news n INNER JOIN users u ON u.id = n.posted_by_id";

fn news_select() -> String {
    format!(
        "n.id, n.title, n.content, n.date, n.image_url, n.posted_by_id, n.created_at, \
         n.updated_at, {POSTER_COLUMNS}"
    )
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: Uuid,
    title: String,
    content: String,
    date: OffsetDateTime,
    image_url: Option<String>,
    posted_by_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<NewsRow> for NewsRecord {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            date: row.date,
            image_url: row.image_url,
            posted_by: row.poster.summary(row.posted_by_id),
            posted_by_id: row.posted_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_news_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ListQuery<NewsFilter>) {
    if let Some(start) = query.filter.start_date {
        qb.push(" AND n.date >= ");
        qb.push_bind(start);
    }
    if let Some(end) = query.filter.end_date {
        qb.push(" AND n.date <= ");
        qb.push_bind(end);
    }
    PostgresRepositories::push_search(qb, &["n.title", "n.content"], query.search_term());
}

#[async_trait]
impl ResourceRepo<News> for PostgresRepositories {
    async fn list(&self, query: &ListQuery<NewsFilter>) -> Result<Paged<NewsRecord>, RepoError> {
        let (mut rows, count) = list_builders(&news_select(), NEWS_FROM, query, push_news_filters);
        Self::push_page(&mut rows, "n", query.sort, query.page);

        let items = rows
            .build_query_as::<NewsRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(NewsRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<NewsRecord>, RepoError> {
        let sql = format!("SELECT {} FROM {NEWS_FROM} WHERE n.id = $1", news_select());
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(NewsRecord::from))
    }

    async fn insert(&self, owner: Uuid, draft: &NewsDraft) -> Result<NewsRecord, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO news (id, title, content, date, image_url, posted_by_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.date)
        .bind(&draft.image_url)
        .bind(owner)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<News>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(&self, id: Uuid, patch: &NewsPatch) -> Result<Option<NewsRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE news
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                date = COALESCE($4, date),
                image_url = COALESCE($5, image_url),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.date)
        .bind(&patch.image_url)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<News>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
