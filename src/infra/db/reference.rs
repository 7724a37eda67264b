use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{ReferenceRepo, RepoError},
    domain::entities::{
        CityRecord, FacultyRecord, LookupRecord, MajorRecord, ProvinceRecord, RoleRecord,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ChildRow {
    id: Uuid,
    parent_id: Uuid,
    name: String,
}

impl PostgresRepositories {
    async fn named_rows(&self, table: &str) -> Result<Vec<NamedRow>, RepoError> {
        let sql = format!("SELECT id, name FROM {table} ORDER BY name ASC");
        sqlx::query_as::<_, NamedRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn named_row(&self, table: &str, id: Uuid) -> Result<Option<NamedRow>, RepoError> {
        let sql = format!("SELECT id, name FROM {table} WHERE id = $1");
        sqlx::query_as::<_, NamedRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn child_rows(
        &self,
        table: &str,
        parent_column: &str,
        parent_id: Uuid,
    ) -> Result<Vec<ChildRow>, RepoError> {
        let sql = format!(
            "SELECT id, {parent_column} AS parent_id, name FROM {table} \
             WHERE {parent_column} = $1 ORDER BY name ASC"
        );
        sqlx::query_as::<_, ChildRow>(&sql)
            .bind(parent_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn child_row(
        &self,
        table: &str,
        parent_column: &str,
        id: Uuid,
    ) -> Result<Option<ChildRow>, RepoError> {
        let sql = format!(
            "SELECT id, {parent_column} AS parent_id, name FROM {table} WHERE id = $1"
        );
        sqlx::query_as::<_, ChildRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

fn to_role(row: NamedRow) -> RoleRecord {
    RoleRecord {
        id: row.id,
        name: row.name,
    }
}

fn to_province(row: NamedRow) -> ProvinceRecord {
    ProvinceRecord {
        id: row.id,
        name: row.name,
    }
}

fn to_faculty(row: NamedRow) -> FacultyRecord {
    FacultyRecord {
        id: row.id,
        name: row.name,
    }
}

fn to_lookup(row: NamedRow) -> LookupRecord {
    LookupRecord {
        id: row.id,
        name: row.name,
    }
}

fn to_city(row: ChildRow) -> CityRecord {
    CityRecord {
        id: row.id,
        province_id: row.parent_id,
        name: row.name,
    }
}

fn to_major(row: ChildRow) -> MajorRecord {
    MajorRecord {
        id: row.id,
        faculty_id: row.parent_id,
        name: row.name,
    }
}

#[async_trait]
impl ReferenceRepo for PostgresRepositories {
    async fn roles(&self) -> Result<Vec<RoleRecord>, RepoError> {
        Ok(self.named_rows("roles").await?.into_iter().map(to_role).collect())
    }

    async fn role(&self, id: Uuid) -> Result<Option<RoleRecord>, RepoError> {
        Ok(self.named_row("roles", id).await?.map(to_role))
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, RepoError> {
        let row = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(to_role))
    }

    async fn provinces(&self) -> Result<Vec<ProvinceRecord>, RepoError> {
        Ok(self
            .named_rows("provinces")
            .await?
            .into_iter()
            .map(to_province)
            .collect())
    }

    async fn province(&self, id: Uuid) -> Result<Option<ProvinceRecord>, RepoError> {
        Ok(self.named_row("provinces", id).await?.map(to_province))
    }

    async fn cities(&self, province_id: Uuid) -> Result<Vec<CityRecord>, RepoError> {
        Ok(self
            .child_rows("cities", "province_id", province_id)
            .await?
            .into_iter()
            .map(to_city)
            .collect())
    }

    async fn city(&self, id: Uuid) -> Result<Option<CityRecord>, RepoError> {
        Ok(self.child_row("cities", "province_id", id).await?.map(to_city))
    }

    async fn faculties(&self) -> Result<Vec<FacultyRecord>, RepoError> {
        Ok(self
            .named_rows("faculties")
            .await?
            .into_iter()
            .map(to_faculty)
            .collect())
    }

    async fn faculty(&self, id: Uuid) -> Result<Option<FacultyRecord>, RepoError> {
        Ok(self.named_row("faculties", id).await?.map(to_faculty))
    }

    async fn majors(&self, faculty_id: Uuid) -> Result<Vec<MajorRecord>, RepoError> {
        Ok(self
            .child_rows("majors", "faculty_id", faculty_id)
            .await?
            .into_iter()
            .map(to_major)
            .collect())
    }

    async fn major(&self, id: Uuid) -> Result<Option<MajorRecord>, RepoError> {
        Ok(self.child_row("majors", "faculty_id", id).await?.map(to_major))
    }

    async fn job_fields(&self) -> Result<Vec<LookupRecord>, RepoError> {
        Ok(self
            .named_rows("job_fields")
            .await?
            .into_iter()
            .map(to_lookup)
            .collect())
    }

    async fn job_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError> {
        Ok(self.named_row("job_fields", id).await?.map(to_lookup))
    }

    async fn collaboration_fields(&self) -> Result<Vec<LookupRecord>, RepoError> {
        Ok(self
            .named_rows("collaboration_fields")
            .await?
            .into_iter()
            .map(to_lookup)
            .collect())
    }

    async fn collaboration_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError> {
        Ok(self.named_row("collaboration_fields", id).await?.map(to_lookup))
    }
}
