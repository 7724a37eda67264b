//! Generic cacheable CRUD engine.
//!
//! Each posted resource describes itself through [`Resource`] (namespace, policy, sorting,
//! field rules) and gets list/get/create/update/delete with cache-aside reads and
//! invalidation on writes from [`ResourceService`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use uuid::Uuid;

use crate::application::error::{Entity, ServiceError};
use crate::application::pagination::{ListQuery, Page, PageRequest, Sort, SortOrder};
use crate::application::policy::{Action, MutationPolicy, authorize};
use crate::application::repos::ResourceRepo;
use crate::cache::CacheAside;
use crate::domain::principal::Principal;
use crate::domain::validation::ValidationErrors;

pub trait Resource: Send + Sync + 'static {
    /// Cache namespace; every key of this resource starts with it.
    const NAMESPACE: &'static str;
    const ENTITY: Entity;
    const POLICY: MutationPolicy;
    const SORT_FIELDS: &'static [&'static str];
    const DEFAULT_SORT: &'static str;
    const DEFAULT_ORDER: SortOrder = SortOrder::Desc;

    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    /// Lenient create payload as clients send it.
    type Input: Send + 'static;
    /// Create payload after field validation.
    type Draft: Send + Sync + 'static;
    type Patch: Send + Sync + 'static;
    type Filter: Serialize + Clone + Default + Send + Sync + 'static;

    fn id(record: &Self::Record) -> Uuid;

    fn owner(record: &Self::Record) -> Uuid;

    fn validate_draft(input: Self::Input) -> Result<Self::Draft, ValidationErrors>;

    /// Checks supplied fields, merged with `current` where rules span several fields.
    fn validate_patch(patch: &Self::Patch, current: &Self::Record) -> Result<(), ValidationErrors>;
}

/// Checks that need the store, such as references to lookup tables. Runs after field
/// validation and before the write.
#[async_trait]
pub trait WriteGuard<R: Resource>: Send + Sync {
    async fn check_draft(&self, _draft: &R::Draft) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn check_patch(&self, _patch: &R::Patch, _current: &R::Record) -> Result<(), ServiceError> {
        Ok(())
    }
}

pub struct NoGuard;

/// Resolves client sort parameters against `R`'s allow-list and assembles a list query.
pub fn list_query<R: Resource>(
    page: PageRequest,
    sort_by: Option<&str>,
    sort_order: Option<SortOrder>,
    search: Option<String>,
    filter: R::Filter,
) -> Result<ListQuery<R::Filter>, ValidationErrors> {
    let sort = Sort::resolve(
        sort_by,
        sort_order,
        R::SORT_FIELDS,
        R::DEFAULT_SORT,
        R::DEFAULT_ORDER,
    )?;
    Ok(ListQuery {
        page,
        sort,
        search,
        filter,
    })
}

impl<R: Resource> WriteGuard<R> for NoGuard {}

#[derive(Serialize)]
struct ListParams<'a, F> {
    search: Option<&'a str>,
    sort_by: &'static str,
    sort_order: SortOrder,
    #[serde(flatten)]
    filter: &'a F,
}

pub struct ResourceService<R: Resource> {
    repo: Arc<dyn ResourceRepo<R>>,
    guard: Arc<dyn WriteGuard<R>>,
    cache: CacheAside,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            guard: self.guard.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(repo: Arc<dyn ResourceRepo<R>>, cache: CacheAside) -> Self {
        Self {
            repo,
            guard: Arc::new(NoGuard),
            cache,
        }
    }

    pub fn with_guard(mut self, guard: Arc<dyn WriteGuard<R>>) -> Self {
        self.guard = guard;
        self
    }

    pub async fn list(&self, query: ListQuery<R::Filter>) -> Result<Page<R::Record>, ServiceError> {
        let params = ListParams {
            search: query.search_term(),
            sort_by: query.sort.field,
            sort_order: query.sort.order,
            filter: &query.filter,
        };
        let key = self
            .cache
            .list_key(R::NAMESPACE, query.page.page, query.page.limit, &params)
            .await;
        self.cache
            .list(R::NAMESPACE, key, || async {
                let paged = self.repo.list(&query).await?;
                Ok::<_, ServiceError>(Page::from_paged(paged, query.page))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<R::Record, ServiceError> {
        self.cache
            .item(R::NAMESPACE, &id.to_string(), || async {
                self.repo.find(id).await.map_err(ServiceError::from)
            })
            .await?
            .ok_or(ServiceError::NotFound(R::ENTITY))
    }

    /// Reads straight from the store; used before mutations so authorization never sees a
    /// cached owner.
    pub async fn find_fresh(&self, id: Uuid) -> Result<R::Record, ServiceError> {
        self.repo
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound(R::ENTITY))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: R::Input,
    ) -> Result<R::Record, ServiceError> {
        authorize(R::POLICY, principal, Action::Create, None)
            .into_result()
            .map_err(ServiceError::Forbidden)?;
        let draft = R::validate_draft(input)?;
        self.guard.check_draft(&draft).await?;

        let record = self.repo.insert(principal.id, &draft).await?;
        self.cache.invalidate(R::NAMESPACE, None).await;

        info!(
            target: "alumni::resources",
            namespace = R::NAMESPACE,
            id = %R::id(&record),
            actor = %principal.id,
            "Created record"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: R::Patch,
    ) -> Result<R::Record, ServiceError> {
        let current = self.find_fresh(id).await?;
        authorize(R::POLICY, principal, Action::Update, Some(R::owner(&current)))
            .into_result()
            .map_err(ServiceError::Forbidden)?;
        R::validate_patch(&patch, &current)?;
        self.guard.check_patch(&patch, &current).await?;

        let record = self
            .repo
            .update(id, &patch)
            .await?
            .ok_or(ServiceError::NotFound(R::ENTITY))?;
        self.cache
            .invalidate(R::NAMESPACE, Some(&id.to_string()))
            .await;

        info!(
            target: "alumni::resources",
            namespace = R::NAMESPACE,
            %id,
            actor = %principal.id,
            "Updated record"
        );
        Ok(record)
    }

    /// Returns the deleted record so callers can cascade their own cache maintenance.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<R::Record, ServiceError> {
        let current = self.find_fresh(id).await?;
        authorize(R::POLICY, principal, Action::Delete, Some(R::owner(&current)))
            .into_result()
            .map_err(ServiceError::Forbidden)?;

        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound(R::ENTITY));
        }
        self.cache
            .invalidate(R::NAMESPACE, Some(&id.to_string()))
            .await;

        info!(
            target: "alumni::resources",
            namespace = R::NAMESPACE,
            %id,
            actor = %principal.id,
            "Deleted record"
        );
        Ok(current)
    }

    /// Purges this resource's lists and, when given, one item.
    pub async fn invalidate(&self, id: Option<Uuid>) {
        let id = id.map(|id| id.to_string());
        self.cache.invalidate(R::NAMESPACE, id.as_deref()).await;
    }
}
