//! Lookup data used to populate client forms.

use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::application::error::Entity;
use crate::application::i18n::Message;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiPath;
use crate::infra::http::api::models::Envelope;
use crate::infra::http::api::state::ApiState;

pub async fn list_roles(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let roles = state.reference.roles().await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::Role), roles).ok())
}

pub async fn list_provinces(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let provinces = state
        .reference
        .provinces()
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::Province), provinces).ok())
}

pub async fn list_cities(
    State(state): State<ApiState>,
    ApiPath(province_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let cities = state
        .reference
        .cities(province_id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::City), cities).ok())
}

pub async fn list_faculties(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let faculties = state
        .reference
        .faculties()
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::Faculty), faculties).ok())
}

pub async fn list_majors(
    State(state): State<ApiState>,
    ApiPath(faculty_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let majors = state
        .reference
        .majors(faculty_id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::Major), majors).ok())
}

pub async fn list_job_fields(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let fields = state
        .reference
        .job_fields()
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::JobField), fields).ok())
}

pub async fn list_collaboration_fields(
    State(state): State<ApiState>,
) -> Result<Response, ApiError> {
    let fields = state
        .reference
        .collaboration_fields()
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::CollaborationField), fields).ok())
}
