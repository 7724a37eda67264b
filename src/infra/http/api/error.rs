use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{Conflict, ErrorReport, ServiceError};
use crate::application::i18n::{Locale, Message, render, render_violation};
use crate::application::repos::RepoError;
use crate::infra::uploads::UploadStorageError;

const SOURCE: &str = "infra::http::api";

/// Per-field messages, keyed by request field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<FieldErrors>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(status: StatusCode, message: Message, locale: Locale, detail: impl Into<String>) -> Self {
        Self {
            status,
            message: render(message, locale).into_owned(),
            errors: None,
            report: ErrorReport::from_message(SOURCE, status, detail),
        }
    }

    pub fn bad_request(locale: Locale, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Message::MalformedRequest, locale, detail)
    }

    pub fn not_found(locale: Locale) -> Self {
        Self::new(StatusCode::NOT_FOUND, Message::RouteNotFound, locale, "no route matched")
    }

    fn with_errors(mut self, errors: FieldErrors) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn from_service(locale: Locale, err: ServiceError) -> Self {
        let (status, message) = classify(&err);
        let report = ErrorReport::from_error(SOURCE, status, &err);
        let errors = match &err {
            ServiceError::Validation(errors) => {
                let mut fields = FieldErrors::new();
                for violation in errors.violations() {
                    fields
                        .entry(violation.field)
                        .or_default()
                        .push(render_violation(violation, locale));
                }
                fields
            }
            ServiceError::Conflict(conflict) => conflict
                .field()
                .map(|field| {
                    let text = render(Message::Conflict(*conflict), locale).into_owned();
                    FieldErrors::from([(field, vec![text])])
                })
                .unwrap_or_default(),
            _ => FieldErrors::new(),
        };

        // The first field message is more useful to clients than the generic headline.
        let headline = match &err {
            ServiceError::Validation(errors) => errors
                .violations()
                .first()
                .map(|violation| render_violation(violation, locale)),
            _ => None,
        };
        let message = headline.unwrap_or_else(|| render(message, locale).into_owned());

        Self {
            status,
            message,
            errors: None,
            report,
        }
        .with_errors(errors)
    }
}

fn classify(err: &ServiceError) -> (StatusCode, Message) {
    match err {
        ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, Message::ValidationFailed),
        ServiceError::NotFound(entity) => (StatusCode::NOT_FOUND, Message::NotFound(*entity)),
        ServiceError::Forbidden(denial) => (StatusCode::FORBIDDEN, Message::Forbidden(*denial)),
        ServiceError::Unauthenticated(failure) => {
            (StatusCode::UNAUTHORIZED, Message::Unauthenticated(*failure))
        }
        ServiceError::Conflict(conflict) => (StatusCode::CONFLICT, Message::Conflict(*conflict)),
        ServiceError::Repo(repo) => match repo {
            RepoError::Timeout => (StatusCode::SERVICE_UNAVAILABLE, Message::ServiceUnavailable),
            RepoError::Duplicate { .. } | RepoError::Integrity { .. } => {
                (StatusCode::CONFLICT, Message::Conflict(Conflict::Other))
            }
            RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, Message::MalformedRequest),
            RepoError::NotFound | RepoError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Message::ServerError)
            }
        },
        ServiceError::Storage(storage) => match storage {
            UploadStorageError::TooLarge { .. } | UploadStorageError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, Message::PayloadTooLarge)
            }
            UploadStorageError::PayloadStream { .. } | UploadStorageError::EmptyPayload => {
                (StatusCode::BAD_REQUEST, Message::MalformedRequest)
            }
            UploadStorageError::InvalidPath | UploadStorageError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Message::ServerError)
            }
        },
        ServiceError::Credential(_) => (StatusCode::INTERNAL_SERVER_ERROR, Message::ServerError),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            message: self.message,
            errors: self.errors,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
