//! Job posting handlers.

use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::assets::AssetKind;
use crate::application::error::Entity;
use crate::application::i18n::Message;
use crate::application::resources::{JobFilter, JobInput, JobPatch, Jobs};
use crate::domain::types::JobType;

use super::{Paging, receive_upload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub job_type: Option<JobType>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub job_field_id: Option<Uuid>,
    pub company: Option<String>,
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    ApiQuery(paging): ApiQuery<Paging>,
    ApiQuery(query): ApiQuery<JobListQuery>,
) -> Result<Response, ApiError> {
    let filter = JobFilter {
        job_type: query.job_type,
        province_id: query.province_id,
        city_id: query.city_id,
        job_field_id: query.job_field_id,
        company: query
            .company
            .map(|company| company.trim().to_string())
            .filter(|company| !company.is_empty()),
    };
    let list = paging
        .into_query::<Jobs>(query.q, filter)
        .map_err(|err| state.fail(err))?;
    let page = state.jobs.list(list).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::Job), page).ok())
}

pub async fn get_job(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let job = state.jobs.get(id).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::Job), job).ok())
}

pub async fn create_job(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<JobInput>,
) -> Result<Response, ApiError> {
    let job = state
        .jobs
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::Job), job).created())
}

pub async fn update_job(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<JobPatch>,
) -> Result<Response, ApiError> {
    let job = state
        .jobs
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::Job), job).ok())
}

pub async fn delete_job(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .jobs
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::Job)))
}

pub async fn upload_job_image(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(&state, AssetKind::Image, "jobs", multipart).await?;
    Ok(Envelope::new(state.locale, Message::ImageUploaded, UploadedUrl { url: stored.url }).ok())
}
