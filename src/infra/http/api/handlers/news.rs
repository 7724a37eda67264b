//! News handlers. Every write is admin-only.

use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::assets::AssetKind;
use crate::application::error::{Entity, ServiceError};
use crate::application::i18n::Message;
use crate::application::resources::{News, NewsFilter, NewsInput, NewsPatch};
use crate::domain::dates;
use crate::domain::validation::{Rule, ValidationErrors};

use super::{Paging, receive_upload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

/// Date bounds arrive as text so malformed values surface as field errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewsListQuery {
    pub q: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl NewsListQuery {
    fn filter(&self) -> Result<NewsFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let filter = NewsFilter {
            start_date: parse_bound(
                &mut errors,
                "start_date",
                self.start_date.as_deref(),
                dates::parse_flexible,
            ),
            end_date: parse_bound(
                &mut errors,
                "end_date",
                self.end_date.as_deref(),
                dates::parse_until,
            ),
        };
        errors.into_result()?;
        filter.validate()?;
        Ok(filter)
    }
}

fn parse_bound(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    parse: fn(&str) -> Option<OffsetDateTime>,
) -> Option<OffsetDateTime> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.push(field, Rule::Invalid);
    }
    parsed
}

pub async fn list_news(
    State(state): State<ApiState>,
    ApiQuery(paging): ApiQuery<Paging>,
    ApiQuery(query): ApiQuery<NewsListQuery>,
) -> Result<Response, ApiError> {
    let filter = query
        .filter()
        .map_err(|err| state.fail(ServiceError::from(err)))?;
    let list = paging
        .into_query::<News>(query.q, filter)
        .map_err(|err| state.fail(err))?;
    let page = state.news.list(list).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::page(state.locale, Message::Listed(Entity::News), page).ok())
}

pub async fn get_news(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let news = state.news.get(id).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Fetched(Entity::News), news).ok())
}

pub async fn create_news(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(input): ApiJson<NewsInput>,
) -> Result<Response, ApiError> {
    let news = state
        .news
        .create(&principal, input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Created(Entity::News), news).created())
}

pub async fn update_news(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<NewsPatch>,
) -> Result<Response, ApiError> {
    let news = state
        .news
        .update(&principal, id, patch)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Updated(Entity::News), news).ok())
}

pub async fn delete_news(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    state
        .news
        .delete(&principal, id)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::Deleted(Entity::News)))
}

pub async fn upload_news_image(
    State(state): State<ApiState>,
    AuthPrincipal(_principal): AuthPrincipal,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(&state, AssetKind::Image, "news", multipart).await?;
    Ok(Envelope::new(state.locale, Message::ImageUploaded, UploadedUrl { url: stored.url }).ok())
}
