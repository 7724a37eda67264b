//! Offset pagination, sorting and list envelopes shared by every listing.

use serde::{Deserialize, Serialize};

use crate::domain::validation::{Rule, ValidationErrors};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated page position. `limit_field` names the query parameter clients used so
/// violations point at `limit` or `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        limit_field: &'static str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = page.unwrap_or(1);
        if page == 0 {
            errors.push("page", Rule::Between(1, i64::from(u32::MAX)));
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            errors.push(limit_field, Rule::Between(1, i64::from(MAX_PAGE_SIZE)));
        }
        errors.into_result()?;
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Sort column resolved against an allow-list; `field` is always one of the allowed names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: &'static str,
    pub order: SortOrder,
}

impl Sort {
    pub fn resolve(
        requested: Option<&str>,
        order: Option<SortOrder>,
        allowed: &[&'static str],
        default_field: &'static str,
        default_order: SortOrder,
    ) -> Result<Self, ValidationErrors> {
        let field = match requested.map(str::trim).filter(|value| !value.is_empty()) {
            None => default_field,
            Some(name) => allowed
                .iter()
                .copied()
                .find(|candidate| *candidate == name)
                .ok_or_else(|| ValidationErrors::single("sort_by", Rule::Invalid))?,
        };
        Ok(Self {
            field,
            order: order.unwrap_or(default_order),
        })
    }
}

/// Everything a repository needs to produce one page of a listing.
#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    pub page: PageRequest,
    pub sort: Sort,
    pub search: Option<String>,
    pub filter: F,
}

impl<F> ListQuery<F> {
    /// Search term with surrounding whitespace removed; blank terms disable search.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Raw repository result: one page of rows plus the unpaged match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit.max(1));
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn from_paged(paged: Paged<T>, request: PageRequest) -> Self {
        Self {
            meta: PageMeta::new(paged.total, request),
            data: paged.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(Some(3), Some(10), "limit").unwrap();
        let meta = PageMeta::new(23, request);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(request.offset(), 20);
        assert_eq!(PageMeta::new(0, request).total_pages, 0);
    }

    #[test]
    fn page_request_rejects_out_of_range_values() {
        let err = PageRequest::new(Some(0), Some(500), "per_page").unwrap_err();
        assert!(err.has("page"));
        assert!(err.has("per_page"));
        assert_eq!(PageRequest::new(None, None, "limit").unwrap(), PageRequest::default());
    }

    #[test]
    fn sort_is_restricted_to_allow_list() {
        let allowed = ["title", "created_at"];
        let sort = Sort::resolve(None, None, &allowed, "created_at", SortOrder::Desc).unwrap();
        assert_eq!(sort.field, "created_at");
        assert_eq!(sort.order, SortOrder::Desc);

        let sort = Sort::resolve(
            Some("title"),
            Some(SortOrder::Asc),
            &allowed,
            "created_at",
            SortOrder::Desc,
        )
        .unwrap();
        assert_eq!(sort.field, "title");

        let err = Sort::resolve(
            Some("password; DROP TABLE users"),
            None,
            &allowed,
            "created_at",
            SortOrder::Desc,
        )
        .unwrap_err();
        assert!(err.has("sort_by"));
    }
}
