//! Read-only access to stored uploads.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::application::i18n::Message;
use crate::infra::uploads::UploadStorageError;

use super::api::ApiState;
use super::api::error::ApiError;

pub async fn serve_upload(State(state): State<ApiState>, Path(path): Path<String>) -> Response {
    match state.assets.storage().read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => ApiError::new(
            StatusCode::NOT_FOUND,
            Message::RouteNotFound,
            state.locale,
            "invalid stored path",
        )
        .into_response(),
        Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            ApiError::new(
                StatusCode::NOT_FOUND,
                Message::RouteNotFound,
                state.locale,
                err.to_string(),
            )
            .into_response()
        }
        Err(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Message::ServerError,
            state.locale,
            err.to_string(),
        )
        .into_response(),
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
