//! Admin-managed alumni directory.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::application::accounts::{AccountFactory, AccountInput, AccountPatch, Enrollment};
use crate::application::error::{Entity, ServiceError};
use crate::application::pagination::{ListQuery, Page, PageRequest, Sort, SortOrder};
use crate::application::policy::{Action, Denial, MutationPolicy, authorize};
use crate::application::repos::{AccountFilter, AccountFootprint, AccountsRepo};
use crate::application::resource::Resource;
use crate::application::resources::{Collaborations, Comments, Forums, Jobs, News, Products};
use crate::cache::CacheAside;
use crate::domain::entities::AccountProfile;
use crate::domain::principal::{Principal, ROLE_ADMIN};
use crate::domain::validation::ValidationErrors;

pub const USERS_NAMESPACE: &str = "users";
pub const USER_SORT_FIELDS: &[&str] = &["name", "enrollment_year", "graduation_year", "created_at"];

#[derive(Serialize)]
struct ListParams<'a> {
    search: Option<&'a str>,
    sort_by: &'static str,
    sort_order: SortOrder,
    #[serde(flatten)]
    filter: &'a AccountFilter,
}

pub fn user_list_query(
    page: PageRequest,
    sort_by: Option<&str>,
    sort_order: Option<SortOrder>,
    search: Option<String>,
    filter: AccountFilter,
) -> Result<ListQuery<AccountFilter>, ValidationErrors> {
    let sort = Sort::resolve(
        sort_by,
        sort_order,
        USER_SORT_FIELDS,
        "created_at",
        SortOrder::Desc,
    )?;
    Ok(ListQuery {
        page,
        sort,
        search,
        filter,
    })
}

#[derive(Clone)]
pub struct UserDirectoryService {
    repo: Arc<dyn AccountsRepo>,
    factory: AccountFactory,
    cache: CacheAside,
}

impl UserDirectoryService {
    pub fn new(repo: Arc<dyn AccountsRepo>, factory: AccountFactory, cache: CacheAside) -> Self {
        Self {
            repo,
            factory,
            cache,
        }
    }

    pub async fn list(
        &self,
        query: ListQuery<AccountFilter>,
    ) -> Result<Page<AccountProfile>, ServiceError> {
        let params = ListParams {
            search: query.search_term(),
            sort_by: query.sort.field,
            sort_order: query.sort.order,
            filter: &query.filter,
        };
        let key = self
            .cache
            .list_key(USERS_NAMESPACE, query.page.page, query.page.limit, &params)
            .await;
        self.cache
            .list(USERS_NAMESPACE, key, || async {
                let paged = self.repo.list(&query).await?;
                Ok::<_, ServiceError>(Page::from_paged(paged, query.page))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<AccountProfile, ServiceError> {
        self.cache
            .item(USERS_NAMESPACE, &id.to_string(), || async {
                self.repo.find(id).await.map_err(ServiceError::from)
            })
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))
    }

    async fn find_fresh(&self, id: Uuid) -> Result<AccountProfile, ServiceError> {
        self.repo
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: AccountInput,
    ) -> Result<AccountProfile, ServiceError> {
        authorize(MutationPolicy::AdminOnly, principal, Action::Create, None)
            .into_result()
            .map_err(ServiceError::Forbidden)?;
        let account = self.factory.prepare(input, Enrollment::Directory).await?;
        let profile = self.repo.insert(&account).await?;
        self.cache.invalidate(USERS_NAMESPACE, None).await;
        info!(
            target: "alumni::users",
            id = %profile.id,
            actor = %principal.id,
            "Created account"
        );
        Ok(profile)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: AccountPatch,
    ) -> Result<AccountProfile, ServiceError> {
        let current = self.find_fresh(id).await?;
        authorize(MutationPolicy::AdminOnly, principal, Action::Update, Some(current.id))
            .into_result()
            .map_err(ServiceError::Forbidden)?;
        let changes = self.factory.changes(patch, &current).await?;
        let profile = self
            .repo
            .update(id, &changes)
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))?;
        self.cache
            .invalidate(USERS_NAMESPACE, Some(&id.to_string()))
            .await;
        info!(target: "alumni::users", %id, actor = %principal.id, "Updated account");
        Ok(profile)
    }

    /// Admin accounts are protected from deletion.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        let current = self.find_fresh(id).await?;
        authorize(MutationPolicy::AdminOnly, principal, Action::Delete, Some(current.id))
            .into_result()
            .map_err(ServiceError::Forbidden)?;
        if current.role == ROLE_ADMIN {
            return Err(ServiceError::Forbidden(Denial::ProtectedAccount));
        }
        let footprint = self
            .repo
            .delete(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))?;
        self.cache
            .invalidate(USERS_NAMESPACE, Some(&id.to_string()))
            .await;
        self.purge_footprint(&footprint).await;
        info!(
            target: "alumni::users",
            %id,
            actor = %principal.id,
            forums = footprint.forums.len(),
            comments = footprint.forum_comments.len(),
            jobs = footprint.jobs.len(),
            news = footprint.news.len(),
            products = footprint.products.len(),
            collaborations = footprint.collaborations.len(),
            "Deleted account"
        );
        Ok(())
    }

    /// Lists of every posted resource may embed the deleted account, so all of them go; items
    /// go only for the rows the store reported.
    async fn purge_footprint(&self, footprint: &AccountFootprint) {
        let touched: [(&'static str, &[Uuid]); 6] = [
            (Forums::NAMESPACE, &footprint.forums),
            (Comments::NAMESPACE, &footprint.forum_comments),
            (Jobs::NAMESPACE, &footprint.jobs),
            (News::NAMESPACE, &footprint.news),
            (Products::NAMESPACE, &footprint.products),
            (Collaborations::NAMESPACE, &footprint.collaborations),
        ];
        for (namespace, ids) in touched {
            self.cache.invalidate(namespace, None).await;
            for id in ids {
                self.cache.forget(namespace, &id.to_string()).await;
            }
        }
    }
}
