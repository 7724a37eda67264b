//! API handlers organized by resource.
//!
//! Each submodule holds the handlers of one resource. Listing helpers and the multipart upload
//! path are shared from here.

mod auth;
mod collaborations;
mod forums;
mod jobs;
mod news;
mod products;
mod reference;
mod users;

pub use auth::*;
pub use collaborations::*;
pub use forums::*;
pub use jobs::*;
pub use news::*;
pub use products::*;
pub use reference::*;
pub use users::*;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use futures::TryStreamExt;
use serde::Deserialize;

use crate::application::assets::{AssetKind, StoredAsset};
use crate::application::error::ServiceError;
use crate::application::i18n::Message;
use crate::application::pagination::{ListQuery, PageRequest, SortOrder};
use crate::application::resource::{Resource, list_query};
use crate::domain::validation::Rule;
use crate::infra::uploads::UploadStorageError;

use super::error::ApiError;
use super::state::ApiState;

// ----- Shared query structs -----

/// Paging and sorting parameters common to every resource listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Paging {
    fn into_query<R: Resource>(
        self,
        search: Option<String>,
        filter: R::Filter,
    ) -> Result<ListQuery<R::Filter>, ServiceError> {
        let page = PageRequest::new(self.page, self.limit, "limit")?;
        Ok(list_query::<R>(
            page,
            self.sort_by.as_deref(),
            self.sort_order,
            search,
            filter,
        )?)
    }
}

// ----- Uploads -----

/// Streams the first multipart field named after `kind` into the asset store.
async fn receive_upload(
    state: &ApiState,
    kind: AssetKind,
    bucket: &'static str,
    mut multipart: Multipart,
) -> Result<StoredAsset, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(state, err))?
    {
        if field.name() != Some(kind.field()) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let stream = field.map_err(stream_error);
        return state
            .assets
            .store_stream(kind, bucket, file_name.as_deref(), stream)
            .await
            .map_err(|err| state.fail(err));
    }

    Err(state.fail(ServiceError::invalid(kind.field(), Rule::Required)))
}

fn stream_error(err: MultipartError) -> UploadStorageError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadStorageError::PayloadTooLarge {
            source: Box::new(err),
        }
    } else {
        UploadStorageError::PayloadStream {
            source: Box::new(err),
        }
    }
}

fn multipart_error(state: &ApiState, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            Message::PayloadTooLarge,
            state.locale,
            err.body_text(),
        )
    } else {
        ApiError::bad_request(state.locale, err.body_text())
    }
}
