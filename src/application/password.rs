//! Argon2id password hashing in PHC string format.
//!
//! Hashing is deliberately slow, so both operations run on the blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::error;

use crate::application::error::ServiceError;

pub async fn hash(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|err| ServiceError::Credential(format!("hashing task failed: {err}")))?
}

/// `false` for a wrong password, for a stored hash that does not parse, and when the
/// verification task itself fails.
pub async fn verify(password: String, stored: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_blocking(&password, &stored)).await {
        Ok(matched) => matched,
        Err(err) => {
            error!(target: "alumni::auth", error = %err, "Password verification task failed");
            false
        }
    }
}

fn hash_blocking(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Credential(err.to_string()))
}

fn verify_blocking(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let stored = hash("rahasia123".to_string()).await.unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify("rahasia123".to_string(), stored.clone()).await);
        assert!(!verify("rahasia124".to_string(), stored).await);
        assert!(!verify("rahasia123".to_string(), "not-a-phc-string".to_string()).await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_thread_free() {
        let ticker = tokio::spawn(async {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            "ticked"
        });
        let stored = hash("rahasia-panjang".to_string()).await.unwrap();
        assert_eq!(ticker.await.unwrap(), "ticked");
        assert!(verify_blocking("rahasia-panjang", &stored));
    }
}
