//! News articles; only admins write them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::Entity;
use crate::application::policy::MutationPolicy;
use crate::application::resource::Resource;
use crate::domain::dates;
use crate::domain::entities::NewsRecord;
use crate::domain::validation::{Rule, ValidationErrors};

use super::non_blank;

pub struct News;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    /// Publication date; defaults to the time of creation.
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub date: Option<OffsetDateTime>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub date: Option<OffsetDateTime>,
    pub image_url: Option<String>,
}

/// Inclusive bounds on the publication date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsFilter {
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

impl NewsFilter {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => {
                Err(ValidationErrors::single("end_date", Rule::After("start_date")))
            }
            _ => Ok(()),
        }
    }
}

impl Resource for News {
    const NAMESPACE: &'static str = "news";
    const ENTITY: Entity = Entity::News;
    const POLICY: MutationPolicy = MutationPolicy::AdminOnly;
    const SORT_FIELDS: &'static [&'static str] = &["title", "date", "created_at"];
    const DEFAULT_SORT: &'static str = "date";

    type Record = NewsRecord;
    type Input = NewsInput;
    type Draft = NewsDraft;
    type Patch = NewsPatch;
    type Filter = NewsFilter;

    fn id(record: &NewsRecord) -> Uuid {
        record.id
    }

    fn owner(record: &NewsRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: NewsInput) -> Result<NewsDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", &input.title, 3);
        errors.min_chars("content", &input.content, 10);
        errors.into_result()?;
        Ok(NewsDraft {
            title: input.title.trim().to_string(),
            content: input.content.trim().to_string(),
            date: input.date.unwrap_or_else(OffsetDateTime::now_utc),
            image_url: non_blank(input.image_url),
        })
    }

    fn validate_patch(patch: &NewsPatch, _current: &NewsRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("title", patch.title.as_deref(), 3);
        errors.min_chars_opt("content", patch.content.as_deref(), 10);
        errors.into_result()
    }
}
