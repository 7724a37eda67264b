use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{JobDraft, JobFilter, JobPatch, Jobs},
    domain::{entities::JobRecord, types::JobType},
};

use super::{
    LIKE_ESCAPE, POSTER_COLUMNS, PosterColumns, PostgresRepositories, contains_pattern,
    list_builders, map_sqlx_error, now,
};

const JOB_FROM: &str = "jobs j \
    INNER JOIN users u ON u.id = j.posted_by_id \
    INNER JOIN job_fields jf ON jf.id = j.job_field_id \
    INNER JOIN provinces p ON p.id = j.province_id \
    INNER JOIN cities ci ON ci.id = j.city_id";

fn job_select() -> String {
    format!(
        "j.id, j.title, j.content, j.company, j.job_type, j.open_from, j.open_until, \
         j.registration_link, j.image_url, j.posted_by_id, j.job_field_id, \
         jf.name AS job_field, j.province_id, p.name AS province, j.city_id, ci.name AS city, \
         j.created_at, j.updated_at, {POSTER_COLUMNS}"
    )
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    content: String,
    company: String,
    job_type: JobType,
    open_from: OffsetDateTime,
    open_until: OffsetDateTime,
    registration_link: Option<String>,
    image_url: Option<String>,
    posted_by_id: Uuid,
    job_field_id: Uuid,
    job_field: String,
    province_id: Uuid,
    province: String,
    city_id: Uuid,
    city: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            company: row.company,
            job_type: row.job_type,
            open_from: row.open_from,
            open_until: row.open_until,
            registration_link: row.registration_link,
            image_url: row.image_url,
            posted_by: row.poster.summary(row.posted_by_id),
            posted_by_id: row.posted_by_id,
            job_field_id: row.job_field_id,
            job_field: row.job_field,
            province_id: row.province_id,
            province: row.province,
            city_id: row.city_id,
            city: row.city,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_job_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ListQuery<JobFilter>) {
    let filter = &query.filter;
    if let Some(job_type) = filter.job_type {
        qb.push(" AND j.job_type = ");
        qb.push_bind(job_type);
    }
    if let Some(province_id) = filter.province_id {
        qb.push(" AND j.province_id = ");
        qb.push_bind(province_id);
    }
    if let Some(city_id) = filter.city_id {
        qb.push(" AND j.city_id = ");
        qb.push_bind(city_id);
    }
    if let Some(job_field_id) = filter.job_field_id {
        qb.push(" AND j.job_field_id = ");
        qb.push_bind(job_field_id);
    }
    if let Some(company) = filter.company.as_deref() {
        qb.push(" AND j.company ILIKE ");
        qb.push_bind(contains_pattern(company));
        qb.push(LIKE_ESCAPE);
    }
    PostgresRepositories::push_search(
        qb,
        &["j.title", "j.company", "j.content"],
        query.search_term(),
    );
}

#[async_trait]
impl ResourceRepo<Jobs> for PostgresRepositories {
    async fn list(&self, query: &ListQuery<JobFilter>) -> Result<Paged<JobRecord>, RepoError> {
        let (mut rows, count) = list_builders(&job_select(), JOB_FROM, query, push_job_filters);
        Self::push_page(&mut rows, "j", query.sort, query.page);

        let items = rows
            .build_query_as::<JobRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(JobRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<JobRecord>, RepoError> {
        let sql = format!("SELECT {} FROM {JOB_FROM} WHERE j.id = $1", job_select());
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(JobRecord::from))
    }

    async fn insert(&self, owner: Uuid, draft: &JobDraft) -> Result<JobRecord, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, title, content, company, job_type, open_from, open_until,
                registration_link, image_url, posted_by_id, job_field_id, province_id, city_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.company)
        .bind(draft.job_type)
        .bind(draft.open_from)
        .bind(draft.open_until)
        .bind(&draft.registration_link)
        .bind(&draft.image_url)
        .bind(owner)
        .bind(draft.job_field_id)
        .bind(draft.province_id)
        .bind(draft.city_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<Jobs>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(&self, id: Uuid, patch: &JobPatch) -> Result<Option<JobRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                company = COALESCE($4, company),
                job_type = COALESCE($5, job_type),
                open_from = COALESCE($6, open_from),
                open_until = COALESCE($7, open_until),
                registration_link = COALESCE($8, registration_link),
                image_url = COALESCE($9, image_url),
                job_field_id = COALESCE($10, job_field_id),
                province_id = COALESCE($11, province_id),
                city_id = COALESCE($12, city_id),
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(&patch.company)
        .bind(patch.job_type)
        .bind(patch.open_from)
        .bind(patch.open_until)
        .bind(&patch.registration_link)
        .bind(&patch.image_url)
        .bind(patch.job_field_id)
        .bind(patch.province_id)
        .bind(patch.city_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<Jobs>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
