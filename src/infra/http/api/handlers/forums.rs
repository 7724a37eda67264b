//! Forum handlers, including nested comments and likes.

use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::assets::AssetKind;
use crate::application::error::Entity;
use crate::application::i18n::Message;
use crate::application::resources::{
    CommentBody, CommentFilter, CommentPatch, Comments, ForumFilter, ForumInput, ForumPatch, Forums,
};

use super::{Paging, receive_upload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal, MaybePrincipal};
use crate::infra::http::api::models::{Envelope, LikeState, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForumListQuery {
    pub q: Option<String>,
    pub posted_by_id: Option<Uuid>,
}

pub async fn list_forums(
    State(state): State<ApiState>,
    ApiQuery(paging): ApiQuery<Paging>,
    ApiQuery(query): ApiQuery<ForumListQuery>,
) -> Result<Response, ApiError> {
    let filter = ForumFilter {
        posted_by_id: query.posted_by_id,
    };
    let list = paging
        .into_query::<Forums>(query.q, filter)
        .map_err(|err| state.fail(err))?;
    let page = state.forums.list(list).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::Forum), page).ok())
}

pub async fn get_forum(
    State(state): State<ApiState>,
    MaybePrincipal(viewer): MaybePrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let detail = state
        .forums
        .detail(id, viewer.as_ref())
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::Forum), detail).ok())
}

pub async fn create_forum(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<ForumInput>,
) -> Result<Response, ApiError> {
    let forum = state
        .forums
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::Forum), forum).created())
}

pub async fn update_forum(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ForumPatch>,
) -> Result<Response, ApiError> {
    let forum = state
        .forums
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::Forum), forum).ok())
}

pub async fn delete_forum(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .forums
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::Forum)))
}

pub async fn upload_forum_image(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(&state, AssetKind::Image, "forums", multipart).await?;
    Ok(Envelope::new(state.locale, Message::ImageUploaded, UploadedUrl { url: stored.url }).ok())
}

// ----- Comments -----

pub async fn list_comments(
    State(state): State<ApiState>,
    ApiPath(forum_id): ApiPath<Uuid>,
    ApiQuery(paging): ApiQuery<Paging>,
) -> Result<Response, ApiError> {
    let list = paging
        .into_query::<Comments>(None, CommentFilter::default())
        .map_err(|err| state.fail(err))?;
    let page = state
        .forums
        .comments(forum_id, list)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::Comment), page).ok())
}

pub async fn create_comment(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(forum_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CommentBody>,
) -> Result<Response, ApiError> {
    let comment = state
        .forums
        .create_comment(&principal, forum_id, body)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::Comment), comment).created())
}

pub async fn update_comment(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(comment_id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CommentPatch>,
) -> Result<Response, ApiError> {
    let comment = state
        .forums
        .update_comment(&principal, comment_id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::Comment), comment).ok())
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(comment_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .forums
        .delete_comment(&principal, comment_id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::Comment)))
}

// ----- Likes -----

pub async fn toggle_like(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(forum_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let is_liked = state
        .forums
        .toggle_like(&principal, forum_id)
        .await
        .map_err(|err| state.fail(err))?;
    let message = if is_liked {
        Message::Liked
    } else {
        Message::Unliked
    };
    Ok(Envelope::new(state.locale, message, LikeState { is_liked }).ok())
}

pub async fn list_likes(
    State(state): State<ApiState>,
    ApiPath(forum_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let likes = state
        .forums
        .likes(forum_id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Listed(Entity::Like), likes).ok())
}
