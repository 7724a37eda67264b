//! Marketplace product and service handlers.

use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::assets::AssetKind;
use crate::application::error::{Entity, ServiceError};
use crate::application::i18n::Message;
use crate::application::resources::{ProductFilter, ProductInput, ProductPatch, Products};
use crate::domain::types::ProductCategory;

use super::{Paging, receive_upload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<ProductCategory>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub posted_by_id: Option<Uuid>,
}

pub async fn list_products(
    State(state): State<ApiState>,
    ApiQuery(paging): ApiQuery<Paging>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Response, ApiError> {
    let filter = ProductFilter {
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        posted_by_id: query.posted_by_id,
    };
    filter
        .validate()
        .map_err(|err| state.fail(ServiceError::from(err)))?;
    let list = paging
        .into_query::<Products>(query.q, filter)
        .map_err(|err| state.fail(err))?;
    let page = state
        .products
        .list(list)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::Product), page).ok())
}

pub async fn get_product(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let product = state.products.get(id).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::Product), product).ok())
}

pub async fn create_product(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Response, ApiError> {
    let product = state
        .products
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::Product), product).created())
}

pub async fn update_product(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Response, ApiError> {
    let product = state
        .products
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::Product), product).ok())
}

pub async fn delete_product(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .products
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::Product)))
}

pub async fn upload_product_image(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(&state, AssetKind::Image, "products", multipart).await?;
    Ok(Envelope::new(state.locale, Message::ImageUploaded, UploadedUrl { url: stored.url }).ok())
}
