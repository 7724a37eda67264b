//! Alumni directory handlers. Reads need a session, writes the admin role.

use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::accounts::{AccountInput, AccountPatch};
use crate::application::error::{Entity, ServiceError};
use crate::application::i18n::Message;
use crate::application::pagination::{PageRequest, SortOrder};
use crate::application::repos::AccountFilter;
use crate::application::users::user_list_query;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, message_only};
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub faculty_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub enrollment_year: Option<i32>,
    pub graduation_year: Option<i32>,
}

pub async fn list_users(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Response, ApiError> {
    let filter = AccountFilter {
        faculty_id: query.faculty_id,
        major_id: query.major_id,
        province_id: query.province_id,
        city_id: query.city_id,
        enrollment_year: query.enrollment_year,
        graduation_year: query.graduation_year,
    };
    let list = PageRequest::new(query.page, query.per_page, "per_page")
        .and_then(|page| {
            user_list_query(
                page,
                query.sort_by.as_deref(),
                query.sort_order,
                query.search,
                filter,
            )
        })
        .map_err(|err| state.fail(ServiceError::from(err)))?;
    let page = state.users.list(list).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::per_page(state.locale, Message::Listed(Entity::User), page).ok())
}

pub async fn get_user(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let user = state.users.get(id).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::User), user).ok())
}

pub async fn create_user(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<AccountInput>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::User), user).created())
}

pub async fn update_user(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AccountPatch>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::User), user).ok())
}

pub async fn delete_user(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .users
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::User)))
}
