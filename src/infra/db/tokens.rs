use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{NewAccessToken, RepoError, TokensRepo},
    domain::entities::AccessTokenRecord,
};

use super::{PostgresRepositories, map_sqlx_error, now};

#[derive(sqlx::FromRow)]
struct AccessTokenRow {
    id: Uuid,
    user_id: Uuid,
    prefix: String,
    hashed_secret: Vec<u8>,
    expires_at: Option<OffsetDateTime>,
    last_used_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl From<AccessTokenRow> for AccessTokenRecord {
    fn from(row: AccessTokenRow) -> Self {
        Self {
            id: row.id,
            account_id: row.user_id,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            expires_at: row.expires_at,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TokensRepo for PostgresRepositories {
    async fn insert(&self, token: NewAccessToken) -> Result<AccessTokenRecord, RepoError> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            INSERT INTO access_tokens (id, user_id, prefix, hashed_secret, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, prefix, hashed_secret, expires_at, last_used_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.account_id)
        .bind(&token.prefix)
        .bind(&token.hashed_secret)
        .bind(token.expires_at)
        .bind(now())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessTokenRecord>, RepoError> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            SELECT id, user_id, prefix, hashed_secret, expires_at, last_used_at, created_at
            FROM access_tokens
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(AccessTokenRecord::from))
    }

    async fn touch(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE access_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
