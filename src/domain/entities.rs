//! Read models returned by the persistence adapters and cached by the services.
//!
//! Every record carries the display fields clients need (poster, lookup names) so a cached
//! entry can be served without touching the store again.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{JobType, ProductCategory, VerificationStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    pub comments_count: i64,
    pub likes_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub content: String,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub liked_by_id: Uuid,
    pub liked_by: PosterSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub company: String,
    pub job_type: JobType,
    #[serde(with = "time::serde::rfc3339")]
    pub open_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub open_until: OffsetDateTime,
    pub registration_link: Option<String>,
    pub image_url: Option<String>,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    pub job_field_id: Uuid,
    pub job_field: String,
    pub province_id: Uuid,
    pub province: String,
    pub city_id: Uuid,
    pub city: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub image_url: Option<String>,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    pub image_url: Option<String>,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub posted_by_id: Uuid,
    pub posted_by: PosterSummary,
    pub collaboration_field_id: Option<Uuid>,
    pub collaboration_field: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Flattened account view with lookup names; never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub nim: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub place_date_of_birth: Option<String>,
    pub enrollment_year: i32,
    pub graduation_year: i32,
    pub instance: Option<String>,
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verification_file_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verification_status: VerificationStatus,
    pub role_id: Uuid,
    pub role: String,
    pub province_id: Uuid,
    pub province: String,
    pub city_id: Uuid,
    pub city: String,
    pub faculty_id: Uuid,
    pub faculty: String,
    pub major_id: Uuid,
    pub major: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Login lookup result: identity plus the stored password hash.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct AccessTokenRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: Uuid,
    pub province_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorRecord {
    pub id: Uuid,
    pub faculty_id: Uuid,
    pub name: String,
}

/// Simple id/name lookup rows (job fields, collaboration fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: Uuid,
    pub name: String,
}
