use std::error::Error as StdError;
use std::fmt;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::application::policy::Denial;
use crate::application::repos::RepoError;
use crate::domain::validation::{Rule, ValidationErrors};
use crate::infra::error::InfraError;
use crate::infra::uploads::UploadStorageError;

/// Diagnostic trail attached to error responses and picked up by the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Kinds of records a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Forum,
    Comment,
    Like,
    Job,
    News,
    Product,
    Collaboration,
    User,
    Role,
    Province,
    City,
    Faculty,
    Major,
    JobField,
    CollaborationField,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Forum => "forum",
            Entity::Comment => "comment",
            Entity::Like => "like",
            Entity::Job => "job",
            Entity::News => "news",
            Entity::Product => "product",
            Entity::Collaboration => "collaboration",
            Entity::User => "user",
            Entity::Role => "role",
            Entity::Province => "province",
            Entity::City => "city",
            Entity::Faculty => "faculty",
            Entity::Major => "major",
            Entity::JobField => "job field",
            Entity::CollaborationField => "collaboration field",
        };
        f.write_str(name)
    }
}

/// Unique value already taken by another account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Email,
    Nim,
    PhoneNumber,
    Other,
}

impl Conflict {
    /// Maps a unique constraint name reported by the store to the offending field.
    pub fn from_constraint(constraint: &str) -> Self {
        if constraint.contains("email") {
            Conflict::Email
        } else if constraint.contains("nim") {
            Conflict::Nim
        } else if constraint.contains("phone") {
            Conflict::PhoneNumber
        } else {
            Conflict::Other
        }
    }

    pub fn field(self) -> Option<&'static str> {
        match self {
            Conflict::Email => Some("email"),
            Conflict::Nim => Some("nim"),
            Conflict::PhoneNumber => Some("phone_number"),
            Conflict::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed or unknown token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token owner no longer exists")]
    AccountMissing,
}

/// Failure of an application service call; the HTTP layer maps each variant to a status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("forbidden: {0:?}")]
    Forbidden(Denial),
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),
    #[error("conflict on {0:?}")]
    Conflict(Conflict),
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Storage(#[from] UploadStorageError),
    #[error("credential hashing failed: {0}")]
    Credential(String),
}

impl ServiceError {
    pub fn invalid(field: &'static str, rule: Rule) -> Self {
        Self::Validation(ValidationErrors::single(field, rule))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<RepoError> for ServiceError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::Duplicate { constraint } => {
                ServiceError::Conflict(Conflict::from_constraint(&constraint))
            }
            other => ServiceError::Repo(other),
        }
    }
}

/// Process bootstrap failures reported by `main` before exiting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
