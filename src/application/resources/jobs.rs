//! Job postings.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::{Entity, ServiceError};
use crate::application::policy::MutationPolicy;
use crate::application::reference::check_location;
use crate::application::repos::ReferenceRepo;
use crate::application::resource::{Resource, WriteGuard};
use crate::domain::dates;
use crate::domain::entities::JobRecord;
use crate::domain::types::JobType;
use crate::domain::validation::{Rule, ValidationErrors};

use super::non_blank;

pub struct Jobs;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobInput {
    pub title: String,
    pub content: String,
    pub company: String,
    pub job_type: Option<JobType>,
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub open_from: Option<OffsetDateTime>,
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub open_until: Option<OffsetDateTime>,
    pub registration_link: Option<String>,
    pub image_url: Option<String>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub job_field_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub content: String,
    pub company: String,
    pub job_type: JobType,
    pub open_from: OffsetDateTime,
    pub open_until: OffsetDateTime,
    pub registration_link: Option<String>,
    pub image_url: Option<String>,
    pub province_id: Uuid,
    pub city_id: Uuid,
    pub job_field_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<JobType>,
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub open_from: Option<OffsetDateTime>,
    #[serde(deserialize_with = "dates::option::deserialize")]
    pub open_until: Option<OffsetDateTime>,
    pub registration_link: Option<String>,
    pub image_url: Option<String>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub job_field_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobFilter {
    pub job_type: Option<JobType>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub job_field_id: Option<Uuid>,
    /// Case-insensitive substring match on the company name.
    pub company: Option<String>,
}

fn check_window(errors: &mut ValidationErrors, from: OffsetDateTime, until: OffsetDateTime) {
    if until <= from {
        errors.push("open_until", Rule::After("open_from"));
    }
}

fn check_link(errors: &mut ValidationErrors, link: Option<&str>) {
    if let Some(link) = link.map(str::trim).filter(|link| !link.is_empty()) {
        errors.http_url("registration_link", link);
    }
}

impl Resource for Jobs {
    const NAMESPACE: &'static str = "jobs";
    const ENTITY: Entity = Entity::Job;
    const POLICY: MutationPolicy = MutationPolicy::OwnerOrAdmin;
    const SORT_FIELDS: &'static [&'static str] = &["title", "open_from", "open_until", "created_at"];
    const DEFAULT_SORT: &'static str = "created_at";

    type Record = JobRecord;
    type Input = JobInput;
    type Draft = JobDraft;
    type Patch = JobPatch;
    type Filter = JobFilter;

    fn id(record: &JobRecord) -> Uuid {
        record.id
    }

    fn owner(record: &JobRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: JobInput) -> Result<JobDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", &input.title, 3);
        errors.min_chars("content", &input.content, 10);
        errors.min_chars("company", &input.company, 2);
        check_link(&mut errors, input.registration_link.as_deref());

        let required = |errors: &mut ValidationErrors, field, present: bool| {
            if !present {
                errors.push(field, Rule::Required);
            }
        };
        required(&mut errors, "job_type", input.job_type.is_some());
        required(&mut errors, "open_from", input.open_from.is_some());
        required(&mut errors, "open_until", input.open_until.is_some());
        required(&mut errors, "province_id", input.province_id.is_some());
        required(&mut errors, "city_id", input.city_id.is_some());
        required(&mut errors, "job_field_id", input.job_field_id.is_some());
        if let (Some(from), Some(until)) = (input.open_from, input.open_until) {
            check_window(&mut errors, from, until);
        }

        match (
            errors.into_result(),
            input.job_type,
            input.open_from,
            input.open_until,
            input.province_id,
            input.city_id,
            input.job_field_id,
        ) {
            (
                Ok(()),
                Some(job_type),
                Some(open_from),
                Some(open_until),
                Some(province_id),
                Some(city_id),
                Some(job_field_id),
            ) => Ok(JobDraft {
                title: input.title.trim().to_string(),
                content: input.content.trim().to_string(),
                company: input.company.trim().to_string(),
                job_type,
                open_from,
                open_until,
                registration_link: non_blank(input.registration_link),
                image_url: non_blank(input.image_url),
                province_id,
                city_id,
                job_field_id,
            }),
            (Err(errors), ..) => Err(errors),
            // Every missing value was recorded above.
            _ => Err(ValidationErrors::single("job_type", Rule::Required)),
        }
    }

    fn validate_patch(patch: &JobPatch, current: &JobRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("title", patch.title.as_deref(), 3);
        errors.min_chars_opt("content", patch.content.as_deref(), 10);
        errors.min_chars_opt("company", patch.company.as_deref(), 2);
        check_link(&mut errors, patch.registration_link.as_deref());
        if patch.open_from.is_some() || patch.open_until.is_some() {
            check_window(
                &mut errors,
                patch.open_from.unwrap_or(current.open_from),
                patch.open_until.unwrap_or(current.open_until),
            );
        }
        errors.into_result()
    }
}

/// Checks job references against the lookup tables, including the city/province pairing on
/// merged values for partial updates.
pub struct JobGuard {
    refs: Arc<dyn ReferenceRepo>,
}

impl JobGuard {
    pub fn new(refs: Arc<dyn ReferenceRepo>) -> Self {
        Self { refs }
    }

    async fn check_field(&self, job_field_id: Uuid, errors: &mut ValidationErrors) -> Result<(), ServiceError> {
        if self.refs.job_field(job_field_id).await?.is_none() {
            errors.push("job_field_id", Rule::Exists);
        }
        Ok(())
    }
}

#[async_trait]
impl WriteGuard<Jobs> for JobGuard {
    async fn check_draft(&self, draft: &JobDraft) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        check_location(self.refs.as_ref(), draft.province_id, draft.city_id, &mut errors).await?;
        self.check_field(draft.job_field_id, &mut errors).await?;
        Ok(errors.into_result()?)
    }

    async fn check_patch(&self, patch: &JobPatch, current: &JobRecord) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        if patch.province_id.is_some() || patch.city_id.is_some() {
            check_location(
                self.refs.as_ref(),
                patch.province_id.unwrap_or(current.province_id),
                patch.city_id.unwrap_or(current.city_id),
                &mut errors,
            )
            .await?;
        }
        if let Some(job_field_id) = patch.job_field_id {
            self.check_field(job_field_id, &mut errors).await?;
        }
        Ok(errors.into_result()?)
    }
}
