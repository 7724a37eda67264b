//! Registration, login and principal resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::accounts::{AccountFactory, AccountInput, Enrollment};
use crate::application::error::{AuthFailure, Entity, ServiceError};
use crate::application::password;
use crate::application::repos::AccountsRepo;
use crate::application::tokens::AccessTokenService;
use crate::application::users::USERS_NAMESPACE;
use crate::cache::CacheAside;
use crate::domain::entities::AccountProfile;
use crate::domain::principal::Principal;
use crate::domain::validation::{Rule, ValidationErrors};

const TARGET: &str = "alumni::auth";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub nim: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountsRepo>,
    factory: AccountFactory,
    tokens: AccessTokenService,
    cache: CacheAside,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountsRepo>,
        factory: AccountFactory,
        tokens: AccessTokenService,
        cache: CacheAside,
    ) -> Self {
        Self {
            accounts,
            factory,
            tokens,
            cache,
        }
    }

    /// Creates a pending alumni account under the default role.
    pub async fn register(&self, input: AccountInput) -> Result<AccountProfile, ServiceError> {
        let account = self
            .factory
            .prepare(input, Enrollment::Registration)
            .await?;
        let profile = self.accounts.insert(&account).await?;
        self.cache.invalidate(USERS_NAMESPACE, None).await;
        info!(target: TARGET, id = %profile.id, "Registered account");
        Ok(profile)
    }

    /// Unknown NIM and wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, ServiceError> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("nim", &input.nim, 1);
        errors.min_chars("password", &input.password, 1);
        errors.into_result()?;

        let credentials = self.accounts.credentials_by_nim(input.nim.trim()).await?;
        let verified = match &credentials {
            Some(found) => {
                password::verify(input.password.clone(), found.password_hash.clone()).await
            }
            None => false,
        };
        let Some(credentials) = credentials.filter(|_| verified) else {
            warn!(target: TARGET, nim = %input.nim.trim(), "Rejected login");
            return Err(ServiceError::invalid("nim", Rule::InvalidCredentials));
        };

        let issued = self.tokens.issue(credentials.id).await?;
        info!(target: TARGET, id = %credentials.id, token = %issued.record.id, "Issued access token");
        Ok(LoginOutcome {
            access_token: issued.token,
            token_type: "Bearer",
        })
    }

    /// Resolves a bearer token into the acting principal with its current role.
    pub async fn resolve(&self, token: &str) -> Result<Principal, AuthFailure> {
        let record = self.tokens.authenticate(token).await?;
        let account = self
            .accounts
            .find(record.account_id)
            .await
            .map_err(|_| AuthFailure::InvalidToken)?
            .ok_or(AuthFailure::AccountMissing)?;
        Ok(Principal::new(account.id, account.name, account.role).with_token(record.id))
    }

    pub async fn me(&self, principal: &Principal) -> Result<AccountProfile, ServiceError> {
        self.accounts
            .find(principal.id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))
    }

    /// Revokes the token the principal authenticated with.
    pub async fn logout(&self, principal: &Principal) -> Result<(), ServiceError> {
        let token_id = principal
            .token_id
            .ok_or(ServiceError::Unauthenticated(AuthFailure::MissingToken))?;
        self.tokens.revoke(token_id).await?;
        info!(target: TARGET, id = %principal.id, token = %token_id, "Revoked access token");
        Ok(())
    }
}
