use std::sync::Arc;

use axum::extract::FromRef;
use time::Duration;

use crate::application::accounts::AccountFactory;
use crate::application::assets::AssetService;
use crate::application::auth::AuthService;
use crate::application::error::ServiceError;
use crate::application::i18n::Locale;
use crate::application::repos::{
    AccountsRepo, ForumLikesRepo, HealthRepo, ReferenceRepo, ResourceRepo, TokensRepo,
};
use crate::application::reference::ReferenceService;
use crate::application::resource::ResourceService;
use crate::application::resources::{
    CollaborationGuard, Collaborations, Comments, ForumService, Forums, JobGuard, Jobs, News,
    Products,
};
use crate::application::tokens::AccessTokenService;
use crate::application::users::UserDirectoryService;
use crate::cache::CacheAside;
use crate::infra::db::PostgresRepositories;

use super::error::ApiError;

/// Every persistence port the API needs. Production wires Postgres for all of them; tests
/// substitute in-memory fakes.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountsRepo>,
    pub tokens: Arc<dyn TokensRepo>,
    pub reference: Arc<dyn ReferenceRepo>,
    pub forums: Arc<dyn ResourceRepo<Forums>>,
    pub comments: Arc<dyn ResourceRepo<Comments>>,
    pub likes: Arc<dyn ForumLikesRepo>,
    pub jobs: Arc<dyn ResourceRepo<Jobs>>,
    pub news: Arc<dyn ResourceRepo<News>>,
    pub products: Arc<dyn ResourceRepo<Products>>,
    pub collaborations: Arc<dyn ResourceRepo<Collaborations>>,
    pub health: Arc<dyn HealthRepo>,
}

impl Repositories {
    pub fn postgres(db: Arc<PostgresRepositories>) -> Self {
        Self {
            accounts: db.clone(),
            tokens: db.clone(),
            reference: db.clone(),
            forums: db.clone(),
            comments: db.clone(),
            likes: db.clone(),
            jobs: db.clone(),
            news: db.clone(),
            products: db.clone(),
            collaborations: db.clone(),
            health: db,
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub locale: Locale,
    pub auth: AuthService,
    pub users: UserDirectoryService,
    pub reference: ReferenceService,
    pub forums: ForumService,
    pub jobs: ResourceService<Jobs>,
    pub news: ResourceService<News>,
    pub products: ResourceService<Products>,
    pub collaborations: ResourceService<Collaborations>,
    pub assets: AssetService,
    pub health: Arc<dyn HealthRepo>,
}

impl ApiState {
    pub fn new(
        repos: Repositories,
        cache: CacheAside,
        assets: AssetService,
        locale: Locale,
        token_ttl: Option<Duration>,
    ) -> Self {
        let factory = AccountFactory::new(repos.reference.clone());
        let tokens = AccessTokenService::new(repos.tokens.clone(), token_ttl);

        let forums = ForumService::new(
            ResourceService::new(repos.forums, cache.clone()),
            ResourceService::new(repos.comments, cache.clone()),
            repos.likes,
        );
        let jobs = ResourceService::new(repos.jobs, cache.clone())
            .with_guard(Arc::new(JobGuard::new(repos.reference.clone())));
        let collaborations = ResourceService::new(repos.collaborations, cache.clone())
            .with_guard(Arc::new(CollaborationGuard::new(repos.reference.clone())));

        Self {
            locale,
            auth: AuthService::new(repos.accounts.clone(), factory.clone(), tokens, cache.clone()),
            users: UserDirectoryService::new(repos.accounts, factory, cache.clone()),
            reference: ReferenceService::new(repos.reference, cache.clone()),
            forums,
            jobs,
            news: ResourceService::new(repos.news, cache.clone()),
            products: ResourceService::new(repos.products, cache),
            collaborations,
            assets,
            health: repos.health,
        }
    }

    /// Converts a service failure into the localized error response.
    pub fn fail(&self, err: ServiceError) -> ApiError {
        ApiError::from_service(self.locale, err)
    }
}

impl FromRef<ApiState> for Locale {
    fn from_ref(state: &ApiState) -> Self {
        state.locale
    }
}
