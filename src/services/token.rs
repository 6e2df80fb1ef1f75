//! Stateless signed access tokens (JWT, HMAC family).

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::auth_service::AuthError;
use crate::config::SecurityConfig;
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Identity carried by a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self> {
        Ok(Self::new(
            config.secret_key.as_bytes(),
            config.signing_algorithm()?,
            config.token_ttl(),
        ))
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs a token for `subject` that expires `ttl` after issuance.
    pub fn create_token(&self, subject: &str, role: Role, ttl: Duration) -> Result<String, AuthError> {
        let issued_at = Utc::now().timestamp();
        let expires_at = issued_at.saturating_add(ttl.num_seconds());

        let claims = Claims {
            sub: subject.to_string(),
            role: role.as_str().to_string(),
            iat: issued_at,
            exp: expires_at,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verifies the signature first, then expiry (`now >= exp` is expired).
    pub fn resolve_token(&self, token: &str) -> Result<TokenSubject, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below without leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })?
            .claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        let role = claims.role.parse::<Role>().map_err(|_| AuthError::Malformed)?;

        Ok(TokenSubject {
            subject: claims.sub,
            role,
        })
    }
}
