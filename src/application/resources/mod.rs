//! Per-resource configuration of the generic engine in [`crate::application::resource`].

pub mod collaborations;
pub mod forums;
pub mod jobs;
pub mod news;
pub mod products;

pub use collaborations::{
    CollaborationDraft, CollaborationFilter, CollaborationGuard, CollaborationInput,
    CollaborationPatch, Collaborations,
};
pub use forums::{
    CommentBody, CommentDraft, CommentFilter, CommentInput, CommentPatch, Comments, ForumDetail,
    ForumDraft, ForumFilter, ForumInput, ForumLikes, ForumPatch, ForumService, Forums,
};
pub use jobs::{JobDraft, JobFilter, JobGuard, JobInput, JobPatch, Jobs};
pub use news::{News, NewsDraft, NewsFilter, NewsInput, NewsPatch};
pub use products::{ProductDraft, ProductFilter, ProductInput, ProductPatch, Products};

/// Trims an optional text field; blank values count as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
