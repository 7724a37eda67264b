#![allow(dead_code)]

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alumni::application::assets::AssetService;
use alumni::application::auth::LoginInput;
use alumni::application::i18n::Locale;
use alumni::application::pagination::{ListQuery, Paged, SortOrder};
use alumni::application::repos::{
    AccountChanges, AccountFilter, AccountFootprint, AccountsRepo, ForumLikesRepo, HealthRepo,
    NewAccessToken, NewAccount, ReferenceRepo, RepoError, ResourceRepo, TokensRepo,
};
use alumni::application::resource::Resource;
use alumni::application::resources::{
    CollaborationDraft, CollaborationPatch, Collaborations, CommentDraft, CommentPatch, Comments,
    ForumDraft, ForumPatch, Forums, JobDraft, JobPatch, Jobs, News, NewsDraft, NewsPatch,
    ProductDraft, ProductPatch, Products,
};
use alumni::cache::{CacheAside, CacheConfig, CacheError, CacheStore, MemoryStore};
use alumni::config::UploadSettings;
use alumni::domain::entities::{
    AccessTokenRecord, AccountCredentials, AccountProfile, CityRecord, CollaborationRecord,
    CommentRecord, FacultyRecord, ForumRecord, JobRecord, LikeRecord, LookupRecord, MajorRecord,
    NewsRecord, PosterSummary, ProductRecord, ProvinceRecord, RoleRecord,
};
use alumni::domain::principal::{Principal, ROLE_ADMIN, ROLE_ALUMNI};
use alumni::domain::types::VerificationStatus;
use alumni::infra::http::{ApiState, Repositories, build_router};
use alumni::infra::uploads::UploadStorage;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

fn poster(id: Uuid) -> PosterSummary {
    PosterSummary {
        id,
        name: format!("Poster {}", &id.to_string()[..8]),
        email: None,
        profile_picture_url: None,
    }
}

fn page_of<T: Clone>(rows: Vec<T>, query: &ListQuery<impl Sized>) -> Paged<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
    let items = rows
        .into_iter()
        .skip(offset)
        .take(query.page.limit as usize)
        .collect();
    Paged { items, total }
}

fn matches_term(term: Option<&str>, haystacks: &[&str]) -> bool {
    match term {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            haystacks
                .iter()
                .any(|value| value.to_lowercase().contains(&term))
        }
    }
}

/// Teaches the in-memory store how to build, patch and filter one resource kind.
pub trait MemoryRow: Resource {
    fn build(id: Uuid, owner: Uuid, draft: &Self::Draft, now: OffsetDateTime) -> Self::Record;

    fn apply(record: &mut Self::Record, patch: &Self::Patch, now: OffsetDateTime);

    fn keep(record: &Self::Record, query: &ListQuery<Self::Filter>) -> bool;
}

impl MemoryRow for Forums {
    fn build(id: Uuid, owner: Uuid, draft: &ForumDraft, now: OffsetDateTime) -> ForumRecord {
        ForumRecord {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            image_url: draft.image_url.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            comments_count: 0,
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut ForumRecord, patch: &ForumPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(content) = &patch.content {
            record.content = content.clone();
        }
        if let Some(image_url) = &patch.image_url {
            record.image_url = Some(image_url.clone());
        }
        record.updated_at = now;
    }

    fn keep(record: &ForumRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        query
            .filter
            .posted_by_id
            .is_none_or(|id| record.posted_by_id == id)
            && matches_term(query.search_term(), &[&record.title, &record.content])
    }
}

impl MemoryRow for Comments {
    fn build(id: Uuid, owner: Uuid, draft: &CommentDraft, now: OffsetDateTime) -> CommentRecord {
        CommentRecord {
            id,
            forum_id: draft.forum_id,
            content: draft.content.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut CommentRecord, patch: &CommentPatch, now: OffsetDateTime) {
        if let Some(content) = &patch.content {
            record.content = content.clone();
        }
        record.updated_at = now;
    }

    fn keep(record: &CommentRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        query.filter.forum_id.is_none_or(|id| record.forum_id == id)
    }
}

impl MemoryRow for Jobs {
    fn build(id: Uuid, owner: Uuid, draft: &JobDraft, now: OffsetDateTime) -> JobRecord {
        JobRecord {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            company: draft.company.clone(),
            job_type: draft.job_type,
            open_from: draft.open_from,
            open_until: draft.open_until,
            registration_link: draft.registration_link.clone(),
            image_url: draft.image_url.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            job_field_id: draft.job_field_id,
            job_field: "Teknologi Informasi".to_string(),
            province_id: draft.province_id,
            province: "Jawa Barat".to_string(),
            city_id: draft.city_id,
            city: "Bandung".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut JobRecord, patch: &JobPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(content) = &patch.content {
            record.content = content.clone();
        }
        if let Some(company) = &patch.company {
            record.company = company.clone();
        }
        if let Some(job_type) = patch.job_type {
            record.job_type = job_type;
        }
        if let Some(open_from) = patch.open_from {
            record.open_from = open_from;
        }
        if let Some(open_until) = patch.open_until {
            record.open_until = open_until;
        }
        if let Some(province_id) = patch.province_id {
            record.province_id = province_id;
        }
        if let Some(city_id) = patch.city_id {
            record.city_id = city_id;
        }
        if let Some(job_field_id) = patch.job_field_id {
            record.job_field_id = job_field_id;
        }
        record.updated_at = now;
    }

    fn keep(record: &JobRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        let filter = &query.filter;
        filter.job_type.is_none_or(|value| record.job_type == value)
            && filter.province_id.is_none_or(|id| record.province_id == id)
            && filter.city_id.is_none_or(|id| record.city_id == id)
            && filter.job_field_id.is_none_or(|id| record.job_field_id == id)
            && matches_term(filter.company.as_deref(), &[&record.company])
            && matches_term(query.search_term(), &[&record.title, &record.content])
    }
}

impl MemoryRow for News {
    fn build(id: Uuid, owner: Uuid, draft: &NewsDraft, now: OffsetDateTime) -> NewsRecord {
        NewsRecord {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            date: draft.date,
            image_url: draft.image_url.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut NewsRecord, patch: &NewsPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(content) = &patch.content {
            record.content = content.clone();
        }
        if let Some(date) = patch.date {
            record.date = date;
        }
        record.updated_at = now;
    }

    fn keep(record: &NewsRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        query.filter.start_date.is_none_or(|start| record.date >= start)
            && query.filter.end_date.is_none_or(|end| record.date <= end)
            && matches_term(query.search_term(), &[&record.title, &record.content])
    }
}

impl MemoryRow for Products {
    fn build(id: Uuid, owner: Uuid, draft: &ProductDraft, now: OffsetDateTime) -> ProductRecord {
        ProductRecord {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            category: draft.category,
            image_url: draft.image_url.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut ProductRecord, patch: &ProductPatch, now: OffsetDateTime) {
        if let Some(name) = &patch.name {
            record.name = name.clone();
        }
        if let Some(description) = &patch.description {
            record.description = description.clone();
        }
        if let Some(price) = patch.price {
            record.price = price;
        }
        if let Some(category) = patch.category {
            record.category = category;
        }
        record.updated_at = now;
    }

    fn keep(record: &ProductRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        let filter = &query.filter;
        filter.category.is_none_or(|value| record.category == value)
            && filter.min_price.is_none_or(|min| record.price >= min)
            && filter.max_price.is_none_or(|max| record.price <= max)
            && filter.posted_by_id.is_none_or(|id| record.posted_by_id == id)
            && matches_term(query.search_term(), &[&record.name, &record.description])
    }
}

impl MemoryRow for Collaborations {
    fn build(
        id: Uuid,
        owner: Uuid,
        draft: &CollaborationDraft,
        now: OffsetDateTime,
    ) -> CollaborationRecord {
        CollaborationRecord {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            image_url: draft.image_url.clone(),
            posted_by_id: owner,
            posted_by: poster(owner),
            collaboration_field_id: draft.collaboration_field_id,
            collaboration_field: draft
                .collaboration_field_id
                .map(|_| "Riset".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut CollaborationRecord, patch: &CollaborationPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(content) = &patch.content {
            record.content = content.clone();
        }
        if let Some(field_id) = patch.collaboration_field_id {
            record.collaboration_field_id = Some(field_id);
        }
        record.updated_at = now;
    }

    fn keep(record: &CollaborationRecord, query: &ListQuery<<Self as Resource>::Filter>) -> bool {
        let filter = &query.filter;
        filter
            .collaboration_field_id
            .is_none_or(|id| record.collaboration_field_id == Some(id))
            && filter.posted_by_id.is_none_or(|id| record.posted_by_id == id)
            && matches_term(query.search_term(), &[&record.title, &record.content])
    }
}

/// Newest-first in-memory table. `reads` counts every list and find that reached it.
pub struct MemoryRecords<R: MemoryRow> {
    rows: Mutex<Vec<R::Record>>,
    reads: AtomicUsize,
}

impl<R: MemoryRow> Default for MemoryRecords<R> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        }
    }
}

impl<R: MemoryRow> MemoryRecords<R> {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Drops every row matching `doomed` and returns their ids.
    async fn remove_where(&self, doomed: impl Fn(&R::Record) -> bool) -> Vec<Uuid> {
        let mut rows = self.rows.lock().await;
        let removed = rows
            .iter()
            .filter(|record| doomed(record))
            .map(R::id)
            .collect();
        rows.retain(|record| !doomed(record));
        removed
    }
}

#[async_trait]
impl<R: MemoryRow> ResourceRepo<R> for MemoryRecords<R> {
    async fn list(&self, query: &ListQuery<R::Filter>) -> Result<Paged<R::Record>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let mut matched: Vec<R::Record> = rows
            .iter()
            .filter(|record| R::keep(record, query))
            .cloned()
            .collect();
        if query.sort.order == SortOrder::Asc {
            matched.reverse();
        }
        Ok(page_of(matched, query))
    }

    async fn find(&self, id: Uuid) -> Result<Option<R::Record>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|record| R::id(record) == id).cloned())
    }

    async fn insert(&self, owner: Uuid, draft: &R::Draft) -> Result<R::Record, RepoError> {
        let record = R::build(Uuid::new_v4(), owner, draft, OffsetDateTime::now_utc());
        self.rows.lock().await.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: &R::Patch) -> Result<Option<R::Record>, RepoError> {
        let mut rows = self.rows.lock().await;
        let Some(record) = rows.iter_mut().find(|record| R::id(record) == id) else {
            return Ok(None);
        };
        R::apply(record, patch, OffsetDateTime::now_utc());
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|record| R::id(record) != id);
        Ok(rows.len() != before)
    }
}

/// Fixed lookup tables. `other_city` belongs to `other_province`, never to `province`.
pub struct MemoryReference {
    pub admin_role: RoleRecord,
    pub alumni_role: RoleRecord,
    pub province: ProvinceRecord,
    pub other_province: ProvinceRecord,
    pub city: CityRecord,
    pub other_city: CityRecord,
    pub faculty: FacultyRecord,
    pub major: MajorRecord,
    pub job_field: LookupRecord,
    pub collaboration_field: LookupRecord,
}

impl Default for MemoryReference {
    fn default() -> Self {
        let province = ProvinceRecord {
            id: Uuid::new_v4(),
            name: "Jawa Barat".to_string(),
        };
        let other_province = ProvinceRecord {
            id: Uuid::new_v4(),
            name: "Jawa Timur".to_string(),
        };
        let faculty = FacultyRecord {
            id: Uuid::new_v4(),
            name: "Fakultas Teknik".to_string(),
        };
        Self {
            admin_role: RoleRecord {
                id: Uuid::new_v4(),
                name: ROLE_ADMIN.to_string(),
            },
            alumni_role: RoleRecord {
                id: Uuid::new_v4(),
                name: ROLE_ALUMNI.to_string(),
            },
            city: CityRecord {
                id: Uuid::new_v4(),
                province_id: province.id,
                name: "Bandung".to_string(),
            },
            other_city: CityRecord {
                id: Uuid::new_v4(),
                province_id: other_province.id,
                name: "Surabaya".to_string(),
            },
            major: MajorRecord {
                id: Uuid::new_v4(),
                faculty_id: faculty.id,
                name: "Informatika".to_string(),
            },
            job_field: LookupRecord {
                id: Uuid::new_v4(),
                name: "Teknologi Informasi".to_string(),
            },
            collaboration_field: LookupRecord {
                id: Uuid::new_v4(),
                name: "Riset".to_string(),
            },
            province,
            other_province,
            faculty,
        }
    }
}

impl MemoryReference {
    fn role_name(&self, id: Uuid) -> String {
        [&self.admin_role, &self.alumni_role]
            .into_iter()
            .find(|role| role.id == id)
            .map(|role| role.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReferenceRepo for MemoryReference {
    async fn roles(&self) -> Result<Vec<RoleRecord>, RepoError> {
        Ok(vec![self.admin_role.clone(), self.alumni_role.clone()])
    }

    async fn role(&self, id: Uuid) -> Result<Option<RoleRecord>, RepoError> {
        Ok([&self.admin_role, &self.alumni_role]
            .into_iter()
            .find(|role| role.id == id)
            .cloned())
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, RepoError> {
        Ok([&self.admin_role, &self.alumni_role]
            .into_iter()
            .find(|role| role.name == name)
            .cloned())
    }

    async fn provinces(&self) -> Result<Vec<ProvinceRecord>, RepoError> {
        Ok(vec![self.province.clone(), self.other_province.clone()])
    }

    async fn province(&self, id: Uuid) -> Result<Option<ProvinceRecord>, RepoError> {
        Ok([&self.province, &self.other_province]
            .into_iter()
            .find(|province| province.id == id)
            .cloned())
    }

    async fn cities(&self, province_id: Uuid) -> Result<Vec<CityRecord>, RepoError> {
        Ok([&self.city, &self.other_city]
            .into_iter()
            .filter(|city| city.province_id == province_id)
            .cloned()
            .collect())
    }

    async fn city(&self, id: Uuid) -> Result<Option<CityRecord>, RepoError> {
        Ok([&self.city, &self.other_city]
            .into_iter()
            .find(|city| city.id == id)
            .cloned())
    }

    async fn faculties(&self) -> Result<Vec<FacultyRecord>, RepoError> {
        Ok(vec![self.faculty.clone()])
    }

    async fn faculty(&self, id: Uuid) -> Result<Option<FacultyRecord>, RepoError> {
        Ok((self.faculty.id == id).then(|| self.faculty.clone()))
    }

    async fn majors(&self, faculty_id: Uuid) -> Result<Vec<MajorRecord>, RepoError> {
        Ok((self.major.faculty_id == faculty_id)
            .then(|| self.major.clone())
            .into_iter()
            .collect())
    }

    async fn major(&self, id: Uuid) -> Result<Option<MajorRecord>, RepoError> {
        Ok((self.major.id == id).then(|| self.major.clone()))
    }

    async fn job_fields(&self) -> Result<Vec<LookupRecord>, RepoError> {
        Ok(vec![self.job_field.clone()])
    }

    async fn job_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError> {
        Ok((self.job_field.id == id).then(|| self.job_field.clone()))
    }

    async fn collaboration_fields(&self) -> Result<Vec<LookupRecord>, RepoError> {
        Ok(vec![self.collaboration_field.clone()])
    }

    async fn collaboration_field(&self, id: Uuid) -> Result<Option<LookupRecord>, RepoError> {
        Ok((self.collaboration_field.id == id).then(|| self.collaboration_field.clone()))
    }
}

/// Tables that reference accounts, cascaded the way the foreign keys cascade.
pub struct AccountContent {
    pub forums: Arc<MemoryRecords<Forums>>,
    pub comments: Arc<MemoryRecords<Comments>>,
    pub likes: Arc<MemoryLikes>,
    pub jobs: Arc<MemoryRecords<Jobs>>,
    pub news: Arc<MemoryRecords<News>>,
    pub products: Arc<MemoryRecords<Products>>,
    pub collaborations: Arc<MemoryRecords<Collaborations>>,
}

impl AccountContent {
    async fn cascade(&self, account: Uuid) -> AccountFootprint {
        let forums = self
            .forums
            .remove_where(|forum| forum.posted_by_id == account)
            .await;
        let mut touched = forums.clone();
        touched.extend(
            self.comments
                .rows
                .lock()
                .await
                .iter()
                .filter(|comment| comment.posted_by_id == account)
                .map(|comment| comment.forum_id),
        );
        let forum_comments = self
            .comments
            .remove_where(|comment| {
                comment.posted_by_id == account || forums.contains(&comment.forum_id)
            })
            .await;
        touched.extend(self.likes.remove_by(account).await);
        AccountFootprint {
            forums: touched,
            forum_comments,
            jobs: self.jobs.remove_where(|job| job.posted_by_id == account).await,
            news: self.news.remove_where(|news| news.posted_by_id == account).await,
            products: self
                .products
                .remove_where(|product| product.posted_by_id == account)
                .await,
            collaborations: self
                .collaborations
                .remove_where(|collaboration| collaboration.posted_by_id == account)
                .await,
        }
    }
}

pub struct MemoryAccounts {
    refs: Arc<MemoryReference>,
    content: AccountContent,
    rows: Mutex<Vec<(AccountProfile, String)>>,
    reads: AtomicUsize,
}

impl MemoryAccounts {
    pub fn new(refs: Arc<MemoryReference>, content: AccountContent) -> Self {
        Self {
            refs,
            content,
            rows: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountsRepo for MemoryAccounts {
    async fn list(
        &self,
        query: &ListQuery<AccountFilter>,
    ) -> Result<Paged<AccountProfile>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let filter = &query.filter;
        let matched = rows
            .iter()
            .map(|(profile, _)| profile)
            .filter(|profile| profile.role != ROLE_ADMIN)
            .filter(|profile| filter.faculty_id.is_none_or(|id| profile.faculty_id == id))
            .filter(|profile| filter.major_id.is_none_or(|id| profile.major_id == id))
            .filter(|profile| filter.province_id.is_none_or(|id| profile.province_id == id))
            .filter(|profile| filter.city_id.is_none_or(|id| profile.city_id == id))
            .filter(|profile| {
                filter
                    .enrollment_year
                    .is_none_or(|year| profile.enrollment_year == year)
            })
            .filter(|profile| {
                filter
                    .graduation_year
                    .is_none_or(|year| profile.graduation_year == year)
            })
            .filter(|profile| {
                matches_term(
                    query.search_term(),
                    &[&profile.name, &profile.nim, &profile.email],
                )
            })
            .cloned()
            .collect();
        Ok(page_of(matched, query))
    }

    async fn find(&self, id: Uuid) -> Result<Option<AccountProfile>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .find(|(profile, _)| profile.id == id)
            .map(|(profile, _)| profile.clone()))
    }

    async fn credentials_by_nim(
        &self,
        nim: &str,
    ) -> Result<Option<AccountCredentials>, RepoError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .find(|(profile, _)| profile.nim == nim)
            .map(|(profile, hash)| AccountCredentials {
                id: profile.id,
                password_hash: hash.clone(),
            }))
    }

    async fn insert(&self, account: &NewAccount) -> Result<AccountProfile, RepoError> {
        let mut rows = self.rows.lock().await;
        for (existing, _) in rows.iter() {
            let constraint = if existing.nim == account.nim {
                Some("users_nim_key")
            } else if existing.email == account.email {
                Some("users_email_key")
            } else if existing.phone_number == account.phone_number {
                Some("users_phone_number_key")
            } else {
                None
            };
            if let Some(constraint) = constraint {
                return Err(RepoError::Duplicate {
                    constraint: constraint.to_string(),
                });
            }
        }

        let now = OffsetDateTime::now_utc();
        let profile = AccountProfile {
            id: Uuid::new_v4(),
            nim: account.nim.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
            place_date_of_birth: account.place_date_of_birth.clone(),
            enrollment_year: account.enrollment_year,
            graduation_year: account.graduation_year,
            instance: account.instance.clone(),
            position: account.position.clone(),
            verification_file_url: account.verification_file_url.clone(),
            profile_picture_url: account.profile_picture_url.clone(),
            verification_status: account.verification_status,
            role_id: account.role_id,
            role: self.refs.role_name(account.role_id),
            province_id: account.province_id,
            province: self.refs.province.name.clone(),
            city_id: account.city_id,
            city: self.refs.city.name.clone(),
            faculty_id: account.faculty_id,
            faculty: self.refs.faculty.name.clone(),
            major_id: account.major_id,
            major: self.refs.major.name.clone(),
            created_at: now,
            updated_at: now,
        };
        rows.insert(0, (profile.clone(), account.password_hash.clone()));
        Ok(profile)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<AccountProfile>, RepoError> {
        let mut rows = self.rows.lock().await;
        let Some((profile, hash)) = rows.iter_mut().find(|(profile, _)| profile.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            profile.name = name.clone();
        }
        if let Some(email) = &changes.email {
            profile.email = email.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            *hash = password_hash.clone();
        }
        if let Some(status) = changes.verification_status {
            profile.verification_status = status;
        }
        if let Some(role_id) = changes.role_id {
            profile.role_id = role_id;
            profile.role = self.refs.role_name(role_id);
        }
        profile.updated_at = OffsetDateTime::now_utc();
        Ok(Some(profile.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<AccountFootprint>, RepoError> {
        {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|(profile, _)| profile.id != id);
            if rows.len() == before {
                return Ok(None);
            }
        }
        Ok(Some(self.content.cascade(id).await))
    }
}

#[derive(Default)]
pub struct MemoryTokens {
    rows: Mutex<HashMap<Uuid, AccessTokenRecord>>,
}

impl MemoryTokens {
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl TokensRepo for MemoryTokens {
    async fn insert(&self, token: NewAccessToken) -> Result<AccessTokenRecord, RepoError> {
        let record = AccessTokenRecord {
            id: Uuid::new_v4(),
            account_id: token.account_id,
            prefix: token.prefix,
            hashed_secret: token.hashed_secret,
            expires_at: token.expires_at,
            last_used_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessTokenRecord>, RepoError> {
        let rows = self.rows.lock().await;
        Ok(rows.values().find(|record| record.prefix == prefix).cloned())
    }

    async fn touch(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(record) = self.rows.lock().await.get_mut(&id) {
            record.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.lock().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryLikes {
    rows: Mutex<Vec<LikeRecord>>,
}

impl MemoryLikes {
    /// Drops the account's likes and returns the forums they were on.
    async fn remove_by(&self, account: Uuid) -> Vec<Uuid> {
        let mut rows = self.rows.lock().await;
        let forums = rows
            .iter()
            .filter(|like| like.liked_by_id == account)
            .map(|like| like.forum_id)
            .collect();
        rows.retain(|like| like.liked_by_id != account);
        forums
    }
}

#[async_trait]
impl ForumLikesRepo for MemoryLikes {
    async fn toggle(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|like| !(like.forum_id == forum_id && like.liked_by_id == account_id));
        if rows.len() != before {
            return Ok(false);
        }
        rows.insert(
            0,
            LikeRecord {
                id: Uuid::new_v4(),
                forum_id,
                liked_by_id: account_id,
                liked_by: poster(account_id),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(true)
    }

    async fn list(&self, forum_id: Uuid) -> Result<Vec<LikeRecord>, RepoError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|like| like.forum_id == forum_id)
            .cloned()
            .collect())
    }

    async fn is_liked(&self, forum_id: Uuid, account_id: Uuid) -> Result<bool, RepoError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .any(|like| like.forum_id == forum_id && like.liked_by_id == account_id))
    }
}

pub struct AlwaysHealthy;

#[async_trait]
impl HealthRepo for AlwaysHealthy {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Cache backend that is permanently unreachable.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn counter(&self, _key: &str) -> Result<u64, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn incr(&self, _key: &str) -> Result<u64, CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

/// In-memory wiring of every port plus handles on the fakes for assertions.
pub struct TestApp {
    pub state: ApiState,
    pub refs: Arc<MemoryReference>,
    pub accounts: Arc<MemoryAccounts>,
    pub tokens: Arc<MemoryTokens>,
    pub forums: Arc<MemoryRecords<Forums>>,
    pub comments: Arc<MemoryRecords<Comments>>,
    pub jobs: Arc<MemoryRecords<Jobs>>,
    pub news: Arc<MemoryRecords<News>>,
    pub products: Arc<MemoryRecords<Products>>,
    pub collaborations: Arc<MemoryRecords<Collaborations>>,
    pub uploads: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new(&CacheConfig::default())))
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self::with_cache(CacheAside::new(store, CacheConfig::default()))
    }

    pub fn with_cache(cache: CacheAside) -> Self {
        let refs = Arc::new(MemoryReference::default());
        let tokens = Arc::new(MemoryTokens::default());
        let forums = Arc::new(MemoryRecords::<Forums>::default());
        let comments = Arc::new(MemoryRecords::<Comments>::default());
        let likes = Arc::new(MemoryLikes::default());
        let jobs = Arc::new(MemoryRecords::<Jobs>::default());
        let news = Arc::new(MemoryRecords::<News>::default());
        let products = Arc::new(MemoryRecords::<Products>::default());
        let collaborations = Arc::new(MemoryRecords::<Collaborations>::default());
        let accounts = Arc::new(MemoryAccounts::new(
            refs.clone(),
            AccountContent {
                forums: forums.clone(),
                comments: comments.clone(),
                likes: likes.clone(),
                jobs: jobs.clone(),
                news: news.clone(),
                products: products.clone(),
                collaborations: collaborations.clone(),
            },
        ));

        let repos = Repositories {
            accounts: accounts.clone(),
            tokens: tokens.clone(),
            reference: refs.clone(),
            forums: forums.clone(),
            comments: comments.clone(),
            likes,
            jobs: jobs.clone(),
            news: news.clone(),
            products: products.clone(),
            collaborations: collaborations.clone(),
            health: Arc::new(AlwaysHealthy),
        };

        let uploads = tempfile::tempdir().expect("temp upload dir");
        let storage = UploadStorage::new(uploads.path().to_path_buf()).expect("upload storage");
        let assets = AssetService::new(Arc::new(storage), "/storage", MAX_IMAGE_BYTES);
        let state = ApiState::new(repos, cache, assets, Locale::Id, None);

        Self {
            state,
            refs,
            accounts,
            tokens,
            forums,
            comments,
            jobs,
            news,
            products,
            collaborations,
            uploads,
        }
    }

    /// Inserts a verified account straight into the store and returns its principal.
    pub async fn account(&self, nim: &str, password: &str, admin: bool) -> Principal {
        let role = if admin {
            &self.refs.admin_role
        } else {
            &self.refs.alumni_role
        };
        let hash = alumni::application::password::hash(password.to_string())
            .await
            .expect("hash password");
        let digits: String = nim.chars().filter(char::is_ascii_digit).collect();
        let profile = self
            .accounts
            .insert(&NewAccount {
                nim: nim.to_string(),
                name: format!("Akun {nim}"),
                email: format!("{nim}@alumni.test"),
                password_hash: hash,
                phone_number: format!("0812{digits:0>8}"),
                place_date_of_birth: None,
                enrollment_year: 2015,
                graduation_year: 2019,
                instance: None,
                position: None,
                verification_file_url: None,
                profile_picture_url: None,
                verification_status: VerificationStatus::Verified,
                role_id: role.id,
                province_id: self.refs.province.id,
                city_id: self.refs.city.id,
                faculty_id: self.refs.faculty.id,
                major_id: self.refs.major.id,
            })
            .await
            .expect("insert account");
        Principal::new(profile.id, profile.name, profile.role)
    }

    pub async fn admin(&self) -> Principal {
        self.account("00001", "rahasia-admin", true).await
    }

    pub async fn alumni(&self, nim: &str) -> Principal {
        self.account(nim, "rahasia-alumni", false).await
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        let uploads = UploadSettings {
            directory: self.uploads.path().to_path_buf(),
            public_prefix: "/storage".to_string(),
            max_request_bytes: NonZeroU64::new(2 * MAX_IMAGE_BYTES).expect("non-zero"),
            max_image_bytes: NonZeroU64::new(MAX_IMAGE_BYTES).expect("non-zero"),
        };
        build_router(self.state.clone(), &uploads)
    }

    /// Logs in through the auth service and returns the raw bearer token.
    pub async fn token(&self, nim: &str, password: &str) -> String {
        self.state
            .auth
            .login(LoginInput {
                nim: nim.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("login")
            .access_token
    }

    /// Sends one request through the full router and decodes the JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}
