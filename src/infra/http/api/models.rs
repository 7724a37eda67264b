use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::i18n::{Locale, Message, render};
use crate::application::pagination::{Page, PageMeta};

/// Success envelope: `{message, data, meta?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Meta {
    Limit(PageMeta),
    PerPage(PerPageMeta),
}

/// Directory listings report their page size as `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerPageMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

impl From<PageMeta> for PerPageMeta {
    fn from(meta: PageMeta) -> Self {
        Self {
            total: meta.total,
            page: meta.page,
            per_page: meta.limit,
            total_pages: meta.total_pages,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn new(locale: Locale, message: Message, data: T) -> Self {
        Self {
            message: render(message, locale).into_owned(),
            data,
            meta: None,
        }
    }

    pub fn ok(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }

    pub fn created(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    pub fn page(locale: Locale, message: Message, page: Page<T>) -> Self {
        Self {
            meta: Some(Meta::Limit(page.meta)),
            ..Self::new(locale, message, page.data)
        }
    }

    pub fn per_page(locale: Locale, message: Message, page: Page<T>) -> Self {
        Self {
            meta: Some(Meta::PerPage(page.meta.into())),
            ..Self::new(locale, message, page.data)
        }
    }
}

/// Envelope without a payload, e.g. after deletes: `{message, data: null}`.
pub fn message_only(locale: Locale, message: Message) -> Response {
    Envelope::new(locale, message, ()).ok()
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadedUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::Entity;
    use crate::application::pagination::{PageRequest, Paged};

    #[test]
    fn list_envelopes_carry_meta() {
        let request = PageRequest::new(Some(2), Some(5), "per_page").unwrap();
        let page = Page::from_paged(
            Paged {
                items: vec![1, 2],
                total: 7,
            },
            request,
        );
        let envelope = Envelope::per_page(Locale::En, Message::Listed(Entity::User), page.clone());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["meta"]["per_page"], 5);
        assert_eq!(json["meta"]["total_pages"], 2);
        assert!(json["meta"].get("limit").is_none());

        let json = serde_json::to_value(Envelope::page(
            Locale::En,
            Message::Listed(Entity::Forum),
            page,
        ))
        .unwrap();
        assert_eq!(json["meta"]["limit"], 5);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn meta_is_omitted_for_single_records() {
        let json =
            serde_json::to_value(Envelope::new(Locale::Id, Message::Fetched(Entity::Job), 1)).unwrap();
        assert!(json.get("meta").is_none());
    }
}
