use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{ForumDraft, ForumFilter, ForumPatch, Forums},
    domain::entities::ForumRecord,
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, list_builders, map_sqlx_error, now};

const FORUM_FROM: &str = "forums f INNER JOIN users u ON u.id = f.posted_by_id";

fn forum_select() -> String {
    format!(
        "f.id, f.title, f.content, f.image_url, f.posted_by_id, f.created_at, f.updated_at, \
         {POSTER_COLUMNS}, \
         (SELECT COUNT(*) FROM forum_comments c WHERE c.forum_id = f.id) AS comments_count, \
         (SELECT COUNT(*) FROM forum_likes l WHERE l.forum_id = f.id) AS likes_count"
    )
}

#[derive(sqlx::FromRow)]
struct ForumRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: Option<String>,
    posted_by_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
    comments_count: i64,
    likes_count: i64,
}

impl From<ForumRow> for ForumRecord {
    fn from(row: ForumRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            posted_by_id: row.posted_by_id,
            posted_by: row.poster.summary(row.posted_by_id),
            comments_count: row.comments_count,
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_forum_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ListQuery<ForumFilter>) {
    if let Some(owner) = query.filter.posted_by_id {
        qb.push(" AND f.posted_by_id = ");
        qb.push_bind(owner);
    }
    PostgresRepositories::push_search(qb, &["f.title", "f.content"], query.search_term());
}

#[async_trait]
impl ResourceRepo<Forums> for PostgresRepositories {
    async fn list(&self, query: &ListQuery<ForumFilter>) -> Result<Paged<ForumRecord>, RepoError> {
        let (mut rows, count) =
            list_builders(&forum_select(), FORUM_FROM, query, push_forum_filters);
        Self::push_page(&mut rows, "f", query.sort, query.page);

        let items = rows
            .build_query_as::<ForumRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(ForumRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<ForumRecord>, RepoError> {
        let sql = format!("SELECT {} FROM {FORUM_FROM} WHERE f.id = $1", forum_select());
        let row = sqlx::query_as::<_, ForumRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ForumRecord::from))
    }

    async fn insert(&self, owner: Uuid, draft: &ForumDraft) -> Result<ForumRecord, RepoError> {
        let id = Uuid::new_v4();
        let created_at = now();
        sqlx::query(
            r#"
            INSERT INTO forums (id, title, content, image_url, posted_by_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(owner)
        .bind(created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<Forums>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(&self, id: Uuid, patch: &ForumPatch) -> Result<Option<ForumRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE forums
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(&patch.image_url)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<Forums>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM forums WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
