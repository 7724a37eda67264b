use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ForumLikesRepo, RepoError},
    domain::entities::LikeRecord,
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, map_sqlx_error, now};

#[derive(sqlx::FromRow)]
struct LikeRow {
    id: Uuid,
    forum_id: Uuid,
    liked_by_id: Uuid,
    created_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<LikeRow> for LikeRecord {
    fn from(row: LikeRow) -> Self {
        Self {
            id: row.id,
            forum_id: row.forum_id,
            liked_by_id: row.liked_by_id,
            liked_by: row.poster.summary(row.liked_by_id),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ForumLikesRepo for PostgresRepositories {
    async fn toggle(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let removed = sqlx::query("DELETE FROM forum_likes WHERE forum_id = $1 AND liked_by_id = $2")
            .bind(forum_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let liked = if removed.rows_affected() > 0 {
            false
        } else {
            sqlx::query(
                r#"
                INSERT INTO forum_likes (id, forum_id, liked_by_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (forum_id, liked_by_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(forum_id)
            .bind(account_id)
            .bind(now())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
            true
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(liked)
    }

    async fn list(&self, forum_id: Uuid) -> Result<Vec<LikeRecord>, RepoError> {
        let sql = format!(
            "SELECT l.id, l.forum_id, l.liked_by_id, l.created_at, {POSTER_COLUMNS} \
             FROM forum_likes l INNER JOIN users u ON u.id = l.liked_by_id \
             WHERE l.forum_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC"
        );
        let rows = sqlx::query_as::<_, LikeRow>(&sql)
            .bind(forum_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(LikeRecord::from).collect())
    }

    async fn is_liked(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM forum_likes WHERE forum_id = $1 AND liked_by_id = $2)",
        )
        .bind(forum_id)
        .bind(account_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
