use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{CommentDraft, CommentFilter, CommentPatch, Comments},
    domain::entities::CommentRecord,
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, list_builders, map_sqlx_error, now};

const COMMENT_FROM: &str = "forum_comments c INNER JOIN users u ON u.id = c.posted_by_id";

fn comment_select() -> String {
    format!(
        "c.id, c.forum_id, c.content, c.posted_by_id, c.created_at, c.updated_at, {POSTER_COLUMNS}"
    )
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    forum_id: Uuid,
    content: String,
    posted_by_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            forum_id: row.forum_id,
            content: row.content,
            posted_by_id: row.posted_by_id,
            posted_by: row.poster.summary(row.posted_by_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_comment_filters(
    qb: &mut QueryBuilder<'static, Postgres>,
    query: &ListQuery<CommentFilter>,
) {
    if let Some(forum_id) = query.filter.forum_id {
        qb.push(" AND c.forum_id = ");
        qb.push_bind(forum_id);
    }
}

#[async_trait]
impl ResourceRepo<Comments> for PostgresRepositories {
    async fn list(
        &self,
        query: &ListQuery<CommentFilter>,
    ) -> Result<Paged<CommentRecord>, RepoError> {
        let (mut rows, count) =
            list_builders(&comment_select(), COMMENT_FROM, query, push_comment_filters);
        Self::push_page(&mut rows, "c", query.sort, query.page);

        let items = rows
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(CommentRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let sql = format!(
            "SELECT {} FROM {COMMENT_FROM} WHERE c.id = $1",
            comment_select()
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CommentRecord::from))
    }

    async fn insert(&self, owner: Uuid, draft: &CommentDraft) -> Result<CommentRecord, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO forum_comments (id, forum_id, content, posted_by_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(id)
        .bind(draft.forum_id)
        .bind(&draft.content)
        .bind(owner)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<Comments>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &CommentPatch,
    ) -> Result<Option<CommentRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE forum_comments
            SET content = COALESCE($2, content),
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.content)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<Comments>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM forum_comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
