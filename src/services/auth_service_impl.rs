//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use super::auth_service::{AuthError, AuthService, LoginResult};
use super::password::{hash_password, hash_password_blocking, verify_password_blocking};
use super::policy::Caller;
use super::token::TokenIssuer;
use crate::config::SecurityConfig;
use crate::db::{Store, UserChanges, UserRepository, UserRow, is_unique_violation};
use crate::models::{FieldError, NewUser, Pagination, User, UserPatch};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenIssuer,
    security: SecurityConfig,
    /// Verified against when the identifier is unknown so both failure paths
    /// cost one Argon2 verification. Computed up front so the first unknown
    /// login is not slower than the rest.
    dummy_hash: String,
}

impl SeaOrmAuthService {
    pub fn new(store: Store, security: SecurityConfig) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::from_config(&security)?;
        let dummy_hash = hash_password("vmapi-dummy-password", &security)?;
        Ok(Self {
            store,
            tokens,
            security,
            dummy_hash,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Hashes the password and inserts the row inside one transaction,
    /// mapping taken emails/usernames to [`AuthError::Conflict`].
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthError> {
        let password_hash = hash_password_blocking(&user.password, &self.security).await?;

        let txn = self.store.begin().await?;
        let users = UserRepository::new(&txn);

        if let Some(field) = users
            .find_taken_field(Some(&user.email), Some(&user.username), None)
            .await?
        {
            return Err(AuthError::Conflict(field.to_string()));
        }

        let created = users
            .insert(UserRow {
                email: user.email,
                username: user.username,
                password_hash,
                is_superuser: user.is_superuser,
                role: user.role,
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict("email or username".to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        txn.commit().await?;

        info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let credentials = self.store.users().get_credentials(identifier).await?;

        let (user, password_hash) = match credentials {
            Some(c) => (Some(c.user), c.password_hash),
            None => (None, self.dummy_hash.clone()),
        };

        let is_valid = verify_password_blocking(password, password_hash).await?;

        match user {
            Some(user) if is_valid => {
                if !user.is_active {
                    warn!(user_id = user.id, "Login attempt for inactive account");
                    return Err(AuthError::Inactive);
                }
                Ok(user)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError> {
        let outcome = self.authenticate(identifier, password).await;
        let label = match &outcome {
            Ok(_) => "success",
            Err(e) if e.is_unauthorized() => "rejected",
            Err(_) => "error",
        };
        metrics::counter!("auth_logins_total", "outcome" => label).increment(1);

        let user = outcome?;
        let ttl = self.tokens.default_ttl();
        let access_token = self.tokens.create_token(&user.email, user.role, ttl)?;

        info!(user_id = user.id, role = %user.role, "User authenticated");

        Ok(LoginResult {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: ttl.num_seconds(),
            user,
        })
    }

    async fn resolve_caller(&self, token: &str) -> Result<(Caller, User), AuthError> {
        let subject = self.tokens.resolve_token(token)?;

        let user = self
            .store
            .users()
            .get_by_email(&subject.subject)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        Ok((Caller::from(&user), user))
    }

    async fn register(&self, user: NewUser) -> Result<User, AuthError> {
        let user = NewUser::client(user.email, user.username, user.password);
        let errors = user.validate(self.security.min_password_length);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        self.insert_user(user).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AuthError> {
        let errors = user.validate(0);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        self.insert_user(user).await
    }

    async fn get_user(&self, id: i32) -> Result<User, AuthError> {
        self.store
            .users()
            .get_by_id(id)
            .await?
            .ok_or(AuthError::NotFound(id))
    }

    async fn update_profile(&self, user_id: i32, patch: UserPatch) -> Result<User, AuthError> {
        let errors = patch.validate(self.security.min_password_length);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let password_hash = match &patch.password {
            Some(password) => Some(hash_password_blocking(password, &self.security).await?),
            None => None,
        };

        let txn = self.store.begin().await?;
        let users = UserRepository::new(&txn);

        if let Some(field) = users
            .find_taken_field(patch.email.as_deref(), patch.username.as_deref(), Some(user_id))
            .await?
        {
            return Err(AuthError::Conflict(field.to_string()));
        }

        let updated = users
            .update(
                user_id,
                UserChanges {
                    email: patch.email,
                    username: patch.username,
                    password_hash,
                },
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict("email or username".to_string())
                } else {
                    AuthError::from(e)
                }
            })?
            .ok_or(AuthError::NotFound(user_id))?;

        txn.commit().await?;

        info!(user_id, "Profile updated");
        Ok(updated)
    }

    async fn list_users(
        &self,
        caller: &Caller,
        page: Pagination,
    ) -> Result<Vec<User>, AuthError> {
        if !caller.is_superuser {
            return Err(AuthError::Forbidden);
        }
        if let Err(e) = page.validate() {
            return Err(AuthError::Validation(vec![e]));
        }

        Ok(self.store.users().list(page).await?)
    }

    async fn set_user_active(
        &self,
        caller: &Caller,
        user_id: i32,
        is_active: bool,
    ) -> Result<User, AuthError> {
        if !caller.is_superuser {
            return Err(AuthError::Forbidden);
        }
        if caller.id == user_id && !is_active {
            return Err(AuthError::Validation(vec![FieldError::new(
                "is_active",
                "cannot deactivate your own account",
            )]));
        }

        let user = self
            .store
            .users()
            .set_active(user_id, is_active)
            .await?
            .ok_or(AuthError::NotFound(user_id))?;

        info!(user_id, is_active, by = caller.id, "Account activation changed");
        Ok(user)
    }
}
