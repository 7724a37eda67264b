//! Opaque personal access tokens.
//!
//! A token reads `alm_{prefix}_{secret}`. The prefix is stored in clear for lookup, the secret
//! only as a SHA-256 digest compared in constant time.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::error::{AuthFailure, ServiceError};
use crate::application::repos::{NewAccessToken, TokensRepo};
use crate::domain::entities::AccessTokenRecord;

const TOKEN_PREFIX: &str = "alm";
const PREFIX_LEN: usize = 12;
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: AccessTokenRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct AccessTokenService {
    repo: Arc<dyn TokensRepo>,
    ttl: Option<Duration>,
}

impl AccessTokenService {
    pub fn new(repo: Arc<dyn TokensRepo>, ttl: Option<Duration>) -> Self {
        Self { repo, ttl }
    }

    pub async fn issue(&self, account_id: Uuid) -> Result<IssuedToken, ServiceError> {
        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let record = self
            .repo
            .insert(NewAccessToken {
                account_id,
                prefix,
                hashed_secret: Self::hash_secret(&secret),
                expires_at: self.ttl.map(|ttl| OffsetDateTime::now_utc() + ttl),
            })
            .await?;
        Ok(IssuedToken { record, token })
    }

    /// Resolves a presented token to its stored record.
    pub async fn authenticate(&self, token: &str) -> Result<AccessTokenRecord, AuthFailure> {
        let parsed = Self::parse_token(token).ok_or(AuthFailure::InvalidToken)?;
        let record = self
            .repo
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|_| AuthFailure::InvalidToken)?
            .ok_or(AuthFailure::InvalidToken)?;

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthFailure::InvalidToken);
        }

        let now = OffsetDateTime::now_utc();
        if let Some(expires_at) = record.expires_at
            && expires_at <= now
        {
            return Err(AuthFailure::ExpiredToken);
        }

        // best-effort last_used update; do not block auth
        let repo = self.repo.clone();
        let id = record.id;
        tokio::spawn(async move {
            let _ = repo.touch(id, now).await;
        });

        Ok(record)
    }

    pub async fn revoke(&self, token_id: Uuid) -> Result<(), ServiceError> {
        self.repo.delete(token_id).await?;
        Ok(())
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        Sha256::digest(secret.as_bytes()).to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..PREFIX_LEN].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.trim().splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if prefix.len() != PREFIX_LEN || secret.len() < MIN_SECRET_LEN {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_parse_back() {
        let prefix = AccessTokenService::generate_prefix();
        let secret = AccessTokenService::generate_secret();
        assert_eq!(secret.len(), 64);
        let parsed = AccessTokenService::parse_token(&format!("alm_{prefix}_{secret}")).unwrap();
        assert_eq!(parsed.prefix, prefix);
        assert_eq!(parsed.secret, secret);
    }

    #[test]
    fn foreign_or_truncated_tokens_are_rejected() {
        let secret = "a".repeat(64);
        assert!(AccessTokenService::parse_token(&format!("sk_abcdefabcdef_{secret}")).is_none());
        assert!(AccessTokenService::parse_token("alm_abcdefabcdef_short").is_none());
        assert!(AccessTokenService::parse_token(&format!("alm_abc_{secret}")).is_none());
        assert!(AccessTokenService::parse_token("alm").is_none());
    }
}
