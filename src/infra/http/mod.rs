//! HTTP surface: the REST API, stored file delivery and shared middleware.

pub mod api;
pub mod middleware;
mod storage;

pub use api::{ApiState, Repositories, build_api_router};

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::application::error::ErrorReport;
use crate::application::i18n::Message;
use crate::config::UploadSettings;

use api::error::ApiError;
use middleware::{log_responses, set_request_context};

/// Full application router: API routes, `{public_prefix}/{*path}` for stored files, a DB
/// health probe and a localized 404 fallback, wrapped in request context and response logging.
pub fn build_router(state: ApiState, uploads: &UploadSettings) -> Router {
    let locale = state.locale;
    let body_limit = usize::try_from(uploads.max_request_bytes.get()).unwrap_or(usize::MAX);
    let storage_route = format!(
        "{}/{{*path}}",
        uploads.public_prefix.trim_end_matches('/')
    );

    let static_routes = Router::new()
        .route(&storage_route, get(storage::serve_upload))
        .route("/_health/db", get(db_health))
        .with_state(state.clone());

    build_api_router(state)
        .merge(static_routes)
        .fallback(move || async move { ApiError::not_found(locale) })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<ApiState>) -> Response {
    match state.health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                Message::ServiceUnavailable,
                state.locale,
                err.to_string(),
            )
            .into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
