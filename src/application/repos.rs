//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{ListQuery, Paged};
use crate::application::resource::Resource;
use crate::domain::entities::{
    AccessTokenRecord, AccountCredentials, AccountProfile, CityRecord, FacultyRecord, LikeRecord,
    LookupRecord, MajorRecord, ProvinceRecord, RoleRecord,
};
use crate::domain::types::VerificationStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Storage for one posted resource kind. Owners are passed separately from the draft so a
/// client payload can never choose them.
#[async_trait]
pub trait ResourceRepo<R: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery<R::Filter>) -> Result<Paged<R::Record>, RepoError>;

    async fn find(&self, id: Uuid) -> Result<Option<R::Record>, RepoError>;

    async fn insert(&self, owner: Uuid, draft: &R::Draft) -> Result<R::Record, RepoError>;

    /// Applies only the fields present in `patch`; `None` when the row vanished meanwhile.
    async fn update(&self, id: Uuid, patch: &R::Patch) -> Result<Option<R::Record>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountFilter {
    pub faculty_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub enrollment_year: Option<i32>,
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub nim: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub place_date_of_birth: Option<String>,
    pub enrollment_year: i32,
    pub graduation_year: i32,
    pub instance: Option<String>,
    pub position: Option<String>,
    pub verification_file_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verification_status: VerificationStatus,
    pub role_id: Uuid,
    pub province_id: Uuid,
    pub city_id: Uuid,
    pub faculty_id: Uuid,
    pub major_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub nim: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub place_date_of_birth: Option<String>,
    pub enrollment_year: Option<i32>,
    pub graduation_year: Option<i32>,
    pub instance: Option<String>,
    pub position: Option<String>,
    pub verification_file_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub role_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    /// Directory listing; admin accounts are never included.
    async fn list(&self, query: &ListQuery<AccountFilter>)
    -> Result<Paged<AccountProfile>, RepoError>;

    async fn find(&self, id: Uuid) -> Result<Option<AccountProfile>, RepoError>;

    async fn credentials_by_nim(&self, nim: &str)
    -> Result<Option<AccountCredentials>, RepoError>;

    async fn insert(&self, account: &NewAccount) -> Result<AccountProfile, RepoError>;

    async fn update(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<AccountProfile>, RepoError>;

    /// Removes the account together with everything that cascades from it. `None` when no
    /// such account exists.
    async fn delete(&self, id: Uuid) -> Result<Option<AccountFootprint>, RepoError>;
}

/// Posted rows that vanished or changed when an account was deleted.
///
/// `forums` also holds forums that merely lost a comment or like by the account, since their
/// counters changed. `forum_comments` holds the account's comments and every comment on its
/// own forums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFootprint {
    pub forums: Vec<Uuid>,
    pub forum_comments: Vec<Uuid>,
    pub jobs: Vec<Uuid>,
    pub news: Vec<Uuid>,
    pub products: Vec<Uuid>,
    pub collaborations: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub account_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait TokensRepo: Send + Sync {
    async fn insert(&self, token: NewAccessToken) -> Result<AccessTokenRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessTokenRecord>, RepoError>;

    async fn touch(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ReferenceRepo: Send + Sync {
    async fn roles(&self) -> Result<Vec<RoleRecord>, RepoError>;

    async fn role(&self, id: Uuid) -> Result<Option<RoleRecord>, RepoError>;

    async fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, RepoError>;

    async fn provinces(&self) -> Result<Vec<ProvinceRecord>, RepoError>;

    async fn province(&self, id: Uuid) -> Result<Option<ProvinceRecord>, RepoError>;

    async fn cities(&self, province_id: Uuid) -> Result<Vec<CityRecord>, RepoError>;

    async fn city(&self, id: Uuid) -> Result<Option<CityRecord>, RepoError>;

    async fn faculties(&self) -> Result<Vec<FacultyRecord>, RepoError>;

    async fn faculty(&self, id: Uuid) -> Result<Option<FacultyRecord>, RepoError>;

    async fn majors(&self, faculty_id: Uuid) -> Result<Vec<MajorRecord>, RepoError>;

    async fn major(&self, id: Uuid) -> Result<Option<MajorRecord>, RepoError>;

    async fn job_fields(&self) -> Result<Vec<LookupRecord>, RepoError>;

    async fn job_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError>;

    async fn collaboration_fields(&self) -> Result<Vec<LookupRecord>, RepoError>;

    async fn collaboration_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError>;
}

#[async_trait]
pub trait ForumLikesRepo: Send + Sync {
    /// Flips membership of `(forum_id, account_id)` atomically and returns the new state.
    async fn toggle(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError>;

    /// Likes of one forum, newest first.
    async fn list(&self, forum_id: Uuid) -> Result<Vec<LikeRecord>, RepoError>;

    async fn is_liked(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError>;
}

/// Liveness probe for the backing store.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
