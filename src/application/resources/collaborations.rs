//! Collaboration calls posted by alumni.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::{Entity, ServiceError};
use crate::application::policy::MutationPolicy;
use crate::application::repos::ReferenceRepo;
use crate::application::resource::{Resource, WriteGuard};
use crate::domain::entities::CollaborationRecord;
use crate::domain::validation::{Rule, ValidationErrors};

use super::non_blank;

pub struct Collaborations;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollaborationInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub collaboration_field_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CollaborationDraft {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub collaboration_field_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollaborationPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub collaboration_field_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollaborationFilter {
    pub collaboration_field_id: Option<Uuid>,
    pub posted_by_id: Option<Uuid>,
}

impl Resource for Collaborations {
    const NAMESPACE: &'static str = "collaborations";
    const ENTITY: Entity = Entity::Collaboration;
    const POLICY: MutationPolicy = MutationPolicy::OwnerOrAdmin;
    const SORT_FIELDS: &'static [&'static str] = &["title", "created_at"];
    const DEFAULT_SORT: &'static str = "created_at";

    type Record = CollaborationRecord;
    type Input = CollaborationInput;
    type Draft = CollaborationDraft;
    type Patch = CollaborationPatch;
    type Filter = CollaborationFilter;

    fn id(record: &CollaborationRecord) -> Uuid {
        record.id
    }

    fn owner(record: &CollaborationRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: CollaborationInput) -> Result<CollaborationDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", &input.title, 3);
        errors.min_chars("content", &input.content, 10);
        errors.into_result()?;
        Ok(CollaborationDraft {
            title: input.title.trim().to_string(),
            content: input.content.trim().to_string(),
            image_url: non_blank(input.image_url),
            collaboration_field_id: input.collaboration_field_id,
        })
    }

    fn validate_patch(
        patch: &CollaborationPatch,
        _current: &CollaborationRecord,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("title", patch.title.as_deref(), 3);
        errors.min_chars_opt("content", patch.content.as_deref(), 10);
        errors.into_result()
    }
}

/// Rejects references to collaboration fields that do not exist.
pub struct CollaborationGuard {
    refs: Arc<dyn ReferenceRepo>,
}

impl CollaborationGuard {
    pub fn new(refs: Arc<dyn ReferenceRepo>) -> Self {
        Self { refs }
    }

    async fn check(&self, field_id: Option<Uuid>) -> Result<(), ServiceError> {
        if let Some(field_id) = field_id
            && self.refs.collaboration_field(field_id).await?.is_none()
        {
            return Err(ServiceError::invalid("collaboration_field_id", Rule::Exists));
        }
        Ok(())
    }
}

#[async_trait]
impl WriteGuard<Collaborations> for CollaborationGuard {
    async fn check_draft(&self, draft: &CollaborationDraft) -> Result<(), ServiceError> {
        self.check(draft.collaboration_field_id).await
    }

    async fn check_patch(
        &self,
        patch: &CollaborationPatch,
        _current: &CollaborationRecord,
    ) -> Result<(), ServiceError> {
        self.check(patch.collaboration_field_id).await
    }
}
