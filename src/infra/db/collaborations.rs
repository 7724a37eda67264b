use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{
        CollaborationDraft, CollaborationFilter, CollaborationPatch, Collaborations,
    },
    domain::entities::CollaborationRecord,
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, list_builders, map_sqlx_error, now};

const COLLABORATION_FROM: &str = "collaborations co \
    INNER JOIN users u ON u.id = co.posted_by_id \
    LEFT JOIN collaboration_fields cf ON cf.id = co.collaboration_field_id";

fn collaboration_select() -> String {
    format!(
        "co.id, co.title, co.content, co.image_url, co.posted_by_id, co.collaboration_field_id, \
         cf.name AS collaboration_field, co.created_at, co.updated_at, {POSTER_COLUMNS}"
    )
}

#[derive(sqlx::FromRow)]
struct CollaborationRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: Option<String>,
    posted_by_id: Uuid,
    collaboration_field_id: Option<Uuid>,
    collaboration_field: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<CollaborationRow> for CollaborationRecord {
    fn from(row: CollaborationRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            posted_by: row.poster.summary(row.posted_by_id),
            posted_by_id: row.posted_by_id,
            collaboration_field_id: row.collaboration_field_id,
            collaboration_field: row.collaboration_field,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_collaboration_filters(
    qb: &mut QueryBuilder<'static, Postgres>,
    query: &ListQuery<CollaborationFilter>,
) {
    if let Some(field_id) = query.filter.collaboration_field_id {
        qb.push(" AND co.collaboration_field_id = ");
        qb.push_bind(field_id);
    }
    if let Some(owner) = query.filter.posted_by_id {
        qb.push(" AND co.posted_by_id = ");
        qb.push_bind(owner);
    }
    PostgresRepositories::push_search(qb, &["co.title", "co.content"], query.search_term());
}

#[async_trait]
impl ResourceRepo<Collaborations> for PostgresRepositories {
    async fn list(
        &self,
        query: &ListQuery<CollaborationFilter>,
    ) -> Result<Paged<CollaborationRecord>, RepoError> {
        let (mut rows, count) = list_builders(
            &collaboration_select(),
            COLLABORATION_FROM,
            query,
            push_collaboration_filters,
        );
        Self::push_page(&mut rows, "co", query.sort, query.page);

        let items = rows
            .build_query_as::<CollaborationRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(CollaborationRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<CollaborationRecord>, RepoError> {
        let sql = format!(
            "SELECT {} FROM {COLLABORATION_FROM} WHERE co.id = $1",
            collaboration_select()
        );
        let row = sqlx::query_as::<_, CollaborationRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CollaborationRecord::from))
    }

    async fn insert(
        &self,
        owner: Uuid,
        draft: &CollaborationDraft,
    ) -> Result<CollaborationRecord, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO collaborations (
                id, title, content, image_url, posted_by_id, collaboration_field_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(owner)
        .bind(draft.collaboration_field_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<Collaborations>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &CollaborationPatch,
    ) -> Result<Option<CollaborationRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE collaborations
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                collaboration_field_id = COALESCE($5, collaboration_field_id),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(&patch.image_url)
        .bind(patch.collaboration_field_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<Collaborations>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM collaborations WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
