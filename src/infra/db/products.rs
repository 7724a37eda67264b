use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListQuery, Paged},
    application::repos::{RepoError, ResourceRepo},
    application::resources::{ProductDraft, ProductFilter, ProductPatch, Products},
    domain::{entities::ProductRecord, types::ProductCategory},
};

use super::{POSTER_COLUMNS, PosterColumns, PostgresRepositories, list_builders, map_sqlx_error, now};

const PRODUCT_FROM: &str = "products p INNER JOIN users u ON u.id = p.posted_by_id";

// Prices are NUMERIC(10,2) in the store and f64 on the wire.
fn product_select() -> String {
    format!(
        "p.id, p.name, p.description, p.price::float8 AS price, p.category, p.image_url, \
         p.posted_by_id, p.created_at, p.updated_at, {POSTER_COLUMNS}"
    )
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: f64,
    category: ProductCategory,
    image_url: Option<String>,
    posted_by_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    #[sqlx(flatten)]
    poster: PosterColumns,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            posted_by: row.poster.summary(row.posted_by_id),
            posted_by_id: row.posted_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_product_filters(
    qb: &mut QueryBuilder<'static, Postgres>,
    query: &ListQuery<ProductFilter>,
) {
    let filter = &query.filter;
    if let Some(category) = filter.category {
        qb.push(" AND p.category = ");
        qb.push_bind(category);
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND p.price >= (");
        qb.push_bind(min_price);
        qb.push("::float8)::numeric");
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND p.price <= (");
        qb.push_bind(max_price);
        qb.push("::float8)::numeric");
    }
    if let Some(owner) = filter.posted_by_id {
        qb.push(" AND p.posted_by_id = ");
        qb.push_bind(owner);
    }
    PostgresRepositories::push_search(qb, &["p.name", "p.description"], query.search_term());
}

#[async_trait]
impl ResourceRepo<Products> for PostgresRepositories {
    async fn list(
        &self,
        query: &ListQuery<ProductFilter>,
    ) -> Result<Paged<ProductRecord>, RepoError> {
        let (mut rows, count) =
            list_builders(&product_select(), PRODUCT_FROM, query, push_product_filters);
        Self::push_page(&mut rows, "p", query.sort, query.page);

        let items = rows
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::count(count, self.pool()).await?;

        Ok(Paged {
            items: items.into_iter().map(ProductRecord::from).collect(),
            total,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!(
            "SELECT {} FROM {PRODUCT_FROM} WHERE p.id = $1",
            product_select()
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ProductRecord::from))
    }

    async fn insert(&self, owner: Uuid, draft: &ProductDraft) -> Result<ProductRecord, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price, category, image_url, posted_by_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, ($4::float8)::numeric(10, 2), $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.category)
        .bind(&draft.image_url)
        .bind(owner)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ResourceRepo::<Products>::find(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<ProductRecord>, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE(($4::float8)::numeric(10, 2), price),
                category = COALESCE($5, category),
                image_url = COALESCE($6, image_url),
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(patch.category)
        .bind(&patch.image_url)
        .bind(now())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        ResourceRepo::<Products>::find(self, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
