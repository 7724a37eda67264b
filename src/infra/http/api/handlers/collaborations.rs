//! Collaboration posting handlers.

use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::assets::AssetKind;
use crate::application::error::Entity;
use crate::application::i18n::Message;
use crate::application::resources::{
    CollaborationFilter, CollaborationInput, CollaborationPatch, Collaborations,
};

use super::{Paging, receive_upload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CollaborationListQuery {
    pub q: Option<String>,
    pub collaboration_field_id: Option<Uuid>,
    pub posted_by_id: Option<Uuid>,
}

pub async fn list_collaborations(
    State(state): State<ApiState>,
    ApiQuery(paging): ApiQuery<Paging>,
    ApiQuery(query): ApiQuery<CollaborationListQuery>,
) -> Result<Response, ApiError> {
    let filter = CollaborationFilter {
        collaboration_field_id: query.collaboration_field_id,
        posted_by_id: query.posted_by_id,
    };
    let list = paging
        .into_query::<Collaborations>(query.q, filter)
        .map_err(|err| state.fail(err))?;
    let page = state
        .collaborations
        .list(list)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::Collaboration), page).ok())
}

pub async fn get_collaboration(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let collaboration = state
        .collaborations
        .get(id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::Collaboration), collaboration).ok())
}

pub async fn create_collaboration(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<CollaborationInput>,
) -> Result<Response, ApiError> {
    let collaboration = state
        .collaborations
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(
        Envelope::new(state.locale, Message::Created(Entity::Collaboration), collaboration)
            .created(),
    )
}

pub async fn update_collaboration(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CollaborationPatch>,
) -> Result<Response, ApiError> {
    let collaboration = state
        .collaborations
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::Collaboration), collaboration).ok())
}

pub async fn delete_collaboration(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .collaborations
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::Collaboration)))
}

pub async fn upload_collaboration_image(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(&state, AssetKind::Image, "collaborations", multipart).await?;
    Ok(Envelope::new(state.locale, Message::ImageUploaded, UploadedUrl { url: stored.url }).ok())
}
