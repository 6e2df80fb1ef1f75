use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::FieldError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,50}$").expect("valid username regex"));

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[default]
    #[sea_orm(string_value = "client")]
    Client,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User data without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for the registration and seed paths.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub is_superuser: bool,
    pub role: Role,
}

impl NewUser {
    /// A regular, non-privileged account.
    pub fn client(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            is_superuser: false,
            role: Role::Client,
        }
    }

    #[must_use]
    pub fn validate(&self, min_password_length: usize) -> Vec<FieldError> {
        [
            validate_email(&self.email),
            validate_username(&self.username),
            validate_password(&self.password, min_password_length),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.password.is_none()
    }

    #[must_use]
    pub fn validate(&self, min_password_length: usize) -> Vec<FieldError> {
        [
            self.email.as_deref().and_then(validate_email),
            self.username.as_deref().and_then(validate_username),
            self.password
                .as_deref()
                .and_then(|p| validate_password(p, min_password_length)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn validate_email(email: &str) -> Option<FieldError> {
    (!EMAIL_RE.is_match(email)).then(|| FieldError::new("email", "is not a valid email address"))
}

fn validate_username(username: &str) -> Option<FieldError> {
    (!USERNAME_RE.is_match(username)).then(|| {
        FieldError::new(
            "username",
            "must be 1-50 characters of letters, digits, '.', '_' or '-'",
        )
    })
}

fn validate_password(password: &str, min_length: usize) -> Option<FieldError> {
    (password.chars().count() < min_length).then(|| {
        FieldError::new(
            "password",
            format!("must be at least {min_length} characters"),
        )
    })
}
