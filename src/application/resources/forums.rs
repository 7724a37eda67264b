//! Forums with nested comments and likes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::{Entity, ServiceError};
use crate::application::pagination::{ListQuery, Page, SortOrder};
use crate::application::policy::MutationPolicy;
use crate::application::repos::ForumLikesRepo;
use crate::application::resource::{Resource, ResourceService};
use crate::domain::entities::{CommentRecord, ForumRecord, LikeRecord};
use crate::domain::principal::Principal;
use crate::domain::validation::ValidationErrors;

use super::non_blank;

pub struct Forums;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForumInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForumDraft {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForumPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ForumFilter {
    pub posted_by_id: Option<Uuid>,
}

impl Resource for Forums {
    const NAMESPACE: &'static str = "forums";
    const ENTITY: Entity = Entity::Forum;
    const POLICY: MutationPolicy = MutationPolicy::OwnerOrAdmin;
    const SORT_FIELDS: &'static [&'static str] = &["title", "created_at"];
    const DEFAULT_SORT: &'static str = "created_at";

    type Record = ForumRecord;
    type Input = ForumInput;
    type Draft = ForumDraft;
    type Patch = ForumPatch;
    type Filter = ForumFilter;

    fn id(record: &ForumRecord) -> Uuid {
        record.id
    }

    fn owner(record: &ForumRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: ForumInput) -> Result<ForumDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", &input.title, 3);
        errors.min_chars("content", &input.content, 10);
        errors.into_result()?;
        Ok(ForumDraft {
            title: input.title.trim().to_string(),
            content: input.content.trim().to_string(),
            image_url: non_blank(input.image_url),
        })
    }

    fn validate_patch(patch: &ForumPatch, _current: &ForumRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("title", patch.title.as_deref(), 3);
        errors.min_chars_opt("content", patch.content.as_deref(), 10);
        errors.into_result()
    }
}

pub struct Comments;

/// Comment payload as sent by clients; the forum comes from the route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CommentInput {
    pub forum_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub forum_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentFilter {
    pub forum_id: Option<Uuid>,
}

impl Resource for Comments {
    const NAMESPACE: &'static str = "forum_comments";
    const ENTITY: Entity = Entity::Comment;
    const POLICY: MutationPolicy = MutationPolicy::OwnerOrAdmin;
    const SORT_FIELDS: &'static [&'static str] = &["created_at"];
    const DEFAULT_SORT: &'static str = "created_at";
    const DEFAULT_ORDER: SortOrder = SortOrder::Asc;

    type Record = CommentRecord;
    type Input = CommentInput;
    type Draft = CommentDraft;
    type Patch = CommentPatch;
    type Filter = CommentFilter;

    fn id(record: &CommentRecord) -> Uuid {
        record.id
    }

    fn owner(record: &CommentRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: CommentInput) -> Result<CommentDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("content", &input.content, 1);
        errors.into_result()?;
        Ok(CommentDraft {
            forum_id: input.forum_id,
            content: input.content.trim().to_string(),
        })
    }

    fn validate_patch(patch: &CommentPatch, _current: &CommentRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("content", patch.content.as_deref(), 1);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForumDetail {
    pub forum: ForumRecord,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForumLikes {
    pub data: Vec<LikeRecord>,
    pub total: usize,
}

/// Forum operations. Comment and like changes alter the counts shown in forum views, so each
/// of them also purges the forum caches.
#[derive(Clone)]
pub struct ForumService {
    forums: ResourceService<Forums>,
    comments: ResourceService<Comments>,
    likes: Arc<dyn ForumLikesRepo>,
}

impl ForumService {
    pub fn new(
        forums: ResourceService<Forums>,
        comments: ResourceService<Comments>,
        likes: Arc<dyn ForumLikesRepo>,
    ) -> Self {
        Self {
            forums,
            comments,
            likes,
        }
    }

    pub async fn list(&self, query: ListQuery<ForumFilter>) -> Result<Page<ForumRecord>, ServiceError> {
        self.forums.list(query).await
    }

    /// `is_liked` is computed per viewer and never cached.
    pub async fn detail(
        &self,
        id: Uuid,
        viewer: Option<&Principal>,
    ) -> Result<ForumDetail, ServiceError> {
        let forum = self.forums.get(id).await?;
        let is_liked = match viewer {
            Some(viewer) => self.likes.is_liked(id, viewer.id).await?,
            None => false,
        };
        Ok(ForumDetail { forum, is_liked })
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: ForumInput,
    ) -> Result<ForumRecord, ServiceError> {
        self.forums.create(principal, input).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: ForumPatch,
    ) -> Result<ForumRecord, ServiceError> {
        self.forums.update(principal, id, patch).await
    }

    /// Comments and likes go with the forum at the store level.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.forums.delete(principal, id).await?;
        self.comments.invalidate(None).await;
        Ok(())
    }

    pub async fn comments(
        &self,
        forum_id: Uuid,
        mut query: ListQuery<CommentFilter>,
    ) -> Result<Page<CommentRecord>, ServiceError> {
        self.forums.find_fresh(forum_id).await?;
        query.filter.forum_id = Some(forum_id);
        self.comments.list(query).await
    }

    pub async fn create_comment(
        &self,
        principal: &Principal,
        forum_id: Uuid,
        body: CommentBody,
    ) -> Result<CommentRecord, ServiceError> {
        self.forums.find_fresh(forum_id).await?;
        let comment = self
            .comments
            .create(
                principal,
                CommentInput {
                    forum_id,
                    content: body.content,
                },
            )
            .await?;
        self.forums.invalidate(Some(forum_id)).await;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        principal: &Principal,
        comment_id: Uuid,
        patch: CommentPatch,
    ) -> Result<CommentRecord, ServiceError> {
        let comment = self.comments.update(principal, comment_id, patch).await?;
        self.forums.invalidate(Some(comment.forum_id)).await;
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        principal: &Principal,
        comment_id: Uuid,
    ) -> Result<(), ServiceError> {
        let comment = self.comments.delete(principal, comment_id).await?;
        self.forums.invalidate(Some(comment.forum_id)).await;
        Ok(())
    }

    /// Returns whether the principal likes the forum after the toggle.
    pub async fn toggle_like(
        &self,
        principal: &Principal,
        forum_id: Uuid,
    ) -> Result<bool, ServiceError> {
        self.forums.find_fresh(forum_id).await?;
        let liked = self.likes.toggle(forum_id, principal.id).await?;
        self.forums.invalidate(Some(forum_id)).await;
        Ok(liked)
    }

    pub async fn likes(&self, forum_id: Uuid) -> Result<ForumLikes, ServiceError> {
        self.forums.find_fresh(forum_id).await?;
        let data = self.likes.list(forum_id).await?;
        Ok(ForumLikes {
            total: data.len(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::Rule;

    #[test]
    fn forum_draft_requires_title_and_content() {
        let err = Forums::validate_draft(ForumInput {
            title: "Hi".to_string(),
            content: String::new(),
            image_url: None,
        })
        .unwrap_err();
        assert!(err.has("title"));
        assert!(err.has("content"));

        let draft = Forums::validate_draft(ForumInput {
            title: "  Reuni akbar  ".to_string(),
            content: "Mari berkumpul di kampus".to_string(),
            image_url: Some("   ".to_string()),
        })
        .unwrap();
        assert_eq!(draft.title, "Reuni akbar");
        assert_eq!(draft.image_url, None);
    }

    #[test]
    fn empty_comment_is_required() {
        let err = Comments::validate_draft(CommentInput {
            forum_id: Uuid::new_v4(),
            content: " ".to_string(),
        })
        .unwrap_err();
        assert_eq!(err.violations()[0].rule, Rule::Required);
    }
}
