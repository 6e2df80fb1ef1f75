//! Password hashing with Argon2id.
//!
//! Each hash carries its own random salt and parameters in PHC string form,
//! so verification never needs the configuration used at hashing time.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::warn;

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash. The digest comparison is
/// constant time; an unparsable hash never verifies.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {e}");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Runs [`hash_password`] off the async runtime; Argon2 is CPU bound.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
}

/// Runs [`verify_password`] off the async runtime.
pub async fn verify_password_blocking(password: &str, password_hash: String) -> Result<bool> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_then_verify() {
        let config = cheap_config();
        let hash = hash_password("correct horse", &config).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("correct horse!", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_salts_are_unique() {
        let config = cheap_config();
        let first = hash_password("same password", &config).unwrap();
        let second = hash_password("same password", &config).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same password", &first));
        assert!(verify_password("same password", &second));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1,
            ..SecurityConfig::default()
        };
        assert!(hash_password("pw", &config).is_err());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let config = cheap_config();
        let hash = hash_password_blocking("s3cret-pass", &config).await.unwrap();
        assert!(verify_password_blocking("s3cret-pass", hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("wrong", hash).await.unwrap());
    }
}
