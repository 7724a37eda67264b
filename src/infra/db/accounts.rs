use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{
        AccountChanges, AccountFilter, AccountFootprint, AccountsRepo, NewAccount, RepoError,
    },
    domain::{
        entities::{AccountCredentials, AccountProfile},
        principal::ROLE_ADMIN,
        types::VerificationStatus,
    },
};

use super::{PostgresRepositories, list_builders, map_sqlx_error, now};

const ACCOUNT_FROM: &str = "users u \
    INNER JOIN roles r ON r.id = u.role_id \
    INNER JOIN provinces p ON p.id = u.province_id \
    INNER JOIN cities ci ON ci.id = u.city_id \
    INNER JOIN faculties fa ON fa.id = u.faculty_id \
    INNER JOIN majors m ON m.id = u.major_id";

const FOOTPRINT_FORUMS: &str = "SELECT id FROM forums WHERE posted_by_id = $1 \
    UNION SELECT forum_id FROM forum_comments WHERE posted_by_id = $1 \
    UNION SELECT forum_id FROM forum_likes WHERE liked_by_id = $1";

const FOOTPRINT_COMMENTS: &str = "SELECT c.id FROM forum_comments c \
    INNER JOIN forums f ON f.id = c.forum_id \
    WHERE c.posted_by_id = $1 OR f.posted_by_id = $1";

const ACCOUNT_SELECT: &str = "u.id, u.nim, u.name, u.email, u.phone_number, \
    u.place_date_of_birth, u.enrollment_year, u.graduation_year, u.instance, u.position, \
    u.verification_file_url, u.profile_picture_url, u.verification_status, \
    u.role_id, r.name AS role, u.province_id, p.name AS province, u.city_id, ci.name AS city, \
    u.faculty_id, fa.name AS faculty, u.major_id, m.name AS major, u.created_at, u.updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    nim: String,
    name: String,
    email: String,
    phone_number: String,
    place_date_of_birth: Option<String>,
    enrollment_year: i32,
    graduation_year: i32,
    instance: Option<String>,
    position: Option<String>,
    verification_file_url: Option<String>,
    profile_picture_url: Option<String>,
    verification_status: VerificationStatus,
    role_id: Uuid,
    role: String,
    province_id: Uuid,
    province: String,
    city_id: Uuid,
    city: String,
    faculty_id: Uuid,
    faculty: String,
    major_id: Uuid,
    major: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AccountRow> for AccountProfile {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            nim: row.nim,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            place_date_of_birth: row.place_date_of_birth,
            enrollment_year: row.enrollment_year,
            graduation_year: row.graduation_year,
            instance: row.instance,
            position: row.position,
            verification_file_url: row.verification_file_url,
            profile_picture_url: row.profile_picture_url,
            verification_status: row.verification_status,
            role_id: row.role_id,
            role: row.role,
            province_id: row.province_id,
            province: row.province,
            city_id: row.city_id,
            city: row.city,
            faculty_id: row.faculty_id,
            faculty: row.faculty,
            major_id: row.major_id,
            major: row.major,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    password_hash: String,
}

fn push_account_filters(
    qb: &mut QueryBuilder<'static, Postgres>,
    query: &ListQuery<AccountFilter>,
) {
    qb.push(" AND r.name <> ");
    qb.push_bind(ROLE_ADMIN);

    let filter = &query.filter;
    for (column, value) in [
        ("u.faculty_id", filter.faculty_id),
        ("u.major_id", filter.major_id),
        ("u.province_id", filter.province_id),
        ("u.city_id", filter.city_id),
    ] {
        if let Some(value) = value {
            qb.push(format!(" AND {column} = "));
            qb.push_bind(value);
        }
    }
    if let Some(year) = filter.enrollment_year {
        qb.push(" AND u.enrollment_year = ");
        qb.push_bind(year);
    }
    if let Some(year) = filter.graduation_year {
        qb.push(" AND u.graduation_year = ");
        qb.push_bind(year);
    }
    PostgresRepositories::push_search(
        qb,
        &["u.name", "u.nim", "u.email"],
        query.search_term(),
    );
}

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn list(
        &self,
        query: &ListQuery<AccountFilter>,
    ) -> Result<Paged<AccountProfile>, RepoError> {
        let (mut rows, count) =
            list_builders(ACCOUNT_SELECT, ACCOUNT_FROM, query, push_account_filters);
        Self::push_page(&mut rows, "u", query.sort, query.page);

        let items = rows
            .build_query_as::<AccountRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(AccountProfile::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<AccountProfile>, RepoError> {
        let sql = format!("SELECT {ACCOUNT_SELECT} FROM {ACCOUNT_FROM} WHERE u.id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(AccountProfile::from))
    }

    async fn credentials_by_nim(
        &self,
        nim: &str,
    ) -> Result<Option<AccountCredentials>, RepoError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, password_hash FROM users WHERE nim = $1",
        )
        .bind(nim)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|row| AccountCredentials {
            id: row.id,
            password_hash: row.password_hash,
        }))
    }

    async fn insert(&self, account: &NewAccount) -> Result<AccountProfile, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (
                id, nim, name, email, password_hash, phone_number, place_date_of_birth,
                enrollment_year, graduation_year, instance, position, verification_file_url,
                profile_picture_url, verification_status, role_id, province_id, city_id,
                faculty_id, major_id, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $20
            )
            "#,
        )
        .bind(id)
        .bind(&account.nim)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.phone_number)
        .bind(&account.place_date_of_birth)
        .bind(account.enrollment_year)
        .bind(account.graduation_year)
        .bind(&account.instance)
        .bind(&account.position)
        .bind(&account.verification_file_url)
        .bind(&account.profile_picture_url)
        .bind(account.verification_status)
        .bind(account.role_id)
        .bind(account.province_id)
        .bind(account.city_id)
        .bind(account.faculty_id)
        .bind(account.major_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        AccountsRepo::find(self, id).await?.ok_or(RepoError::NotFound)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<AccountProfile>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET nim = COALESCE($2, nim),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                phone_number = COALESCE($6, phone_number),
                place_date_of_birth = COALESCE($7, place_date_of_birth),
                enrollment_year = COALESCE($8, enrollment_year),
                graduation_year = COALESCE($9, graduation_year),
                instance = COALESCE($10, instance),
                position = COALESCE($11, position),
                verification_file_url = COALESCE($12, verification_file_url),
                profile_picture_url = COALESCE($13, profile_picture_url),
                verification_status = COALESCE($14, verification_status),
                role_id = COALESCE($15, role_id),
                province_id = COALESCE($16, province_id),
                city_id = COALESCE($17, city_id),
                faculty_id = COALESCE($18, faculty_id),
                major_id = COALESCE($19, major_id),
                updated_at = $20
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.nim)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.phone_number)
        .bind(&changes.place_date_of_birth)
        .bind(changes.enrollment_year)
        .bind(changes.graduation_year)
        .bind(&changes.instance)
        .bind(&changes.position)
        .bind(&changes.verification_file_url)
        .bind(&changes.profile_picture_url)
        .bind(changes.verification_status)
        .bind(changes.role_id)
        .bind(changes.province_id)
        .bind(changes.city_id)
        .bind(changes.faculty_id)
        .bind(changes.major_id)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        AccountsRepo::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<AccountFootprint>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        // Row lock blocks concurrent inserts that reference the account until the delete lands.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        if locked.is_none() {
            return Ok(None);
        }

        let mut footprint = AccountFootprint::default();
        for (sql, target) in [
            (FOOTPRINT_FORUMS, &mut footprint.forums),
            (FOOTPRINT_COMMENTS, &mut footprint.forum_comments),
            ("SELECT id FROM jobs WHERE posted_by_id = $1", &mut footprint.jobs),
            ("SELECT id FROM news WHERE posted_by_id = $1", &mut footprint.news),
            ("SELECT id FROM products WHERE posted_by_id = $1", &mut footprint.products),
            (
                "SELECT id FROM collaborations WHERE posted_by_id = $1",
                &mut footprint.collaborations,
            ),
        ] {
            *target = sqlx::query_scalar(sql)
                .bind(id)
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(footprint))
    }
}
