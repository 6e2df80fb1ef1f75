//! Domain service for authentication and user management.
//!
//! Handles credential checks, token issuance and resolution, registration
//! and profile updates.

use serde::Serialize;
use thiserror::Error;

use super::policy::Caller;
use crate::models::{FieldError, NewUser, Pagination, User, UserPatch};

/// Errors specific to authentication and user operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    Inactive,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,

    /// The token is valid but its subject no longer exists.
    #[error("Unknown token subject")]
    UnknownSubject,

    #[error("Forbidden")]
    Forbidden,

    #[error("User {0} not found")]
    NotFound(i32),

    #[error("{0} already registered")]
    Conflict(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the failure means "not authenticated" at the boundary.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::Inactive
                | Self::Expired
                | Self::InvalidSignature
                | Self::Malformed
                | Self::UnknownSubject
        )
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Issued access token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    #[serde(skip)]
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Checks credentials. `identifier` may be an email or a username.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown identifier or
    /// a wrong password alike, and [`AuthError::Inactive`] for a disabled
    /// account with a correct password.
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError>;

    /// Authenticates and issues an access token.
    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token to the current state of its user.
    async fn resolve_caller(&self, token: &str) -> Result<(Caller, User), AuthError>;

    /// Creates a CLIENT account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the email or username is taken.
    async fn register(&self, user: NewUser) -> Result<User, AuthError>;

    /// Creates an account with explicit role and superuser flag (seed path).
    async fn create_user(&self, user: NewUser) -> Result<User, AuthError>;

    async fn get_user(&self, id: i32) -> Result<User, AuthError>;

    /// Applies a partial profile update to the caller's own account.
    async fn update_profile(&self, user_id: i32, patch: UserPatch) -> Result<User, AuthError>;

    /// Lists accounts. Superuser only.
    async fn list_users(&self, caller: &Caller, page: Pagination)
    -> Result<Vec<User>, AuthError>;

    /// Enables or disables an account. Superuser only; a superuser cannot
    /// deactivate itself. Tokens of a disabled account stop resolving.
    async fn set_user_active(
        &self,
        caller: &Caller,
        user_id: i32,
        is_active: bool,
    ) -> Result<User, AuthError>;
}
