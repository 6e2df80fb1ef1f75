use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, users};
use crate::models::{Pagination, Role, User, next_timestamp};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Stored credentials for a login attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

/// Fields for a new row; the password is already hashed.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub role: Role,
}

/// Column changes for an existing row.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

pub struct UserRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Looks the user up by email or username, returning the stored hash.
    pub async fn get_credentials(&self, identifier: &str) -> Result<Option<Credentials>> {
        let user = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(identifier))
                    .add(users::Column::Username.eq(identifier)),
            )
            .order_by_asc(users::Column::Id)
            .one(self.conn)
            .await
            .context("Failed to query user credentials")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            Credentials {
                user: User::from(u),
                password_hash,
            }
        }))
    }

    /// Returns the name of the first unique field (`email` or `username`)
    /// already held by a user other than `exclude_id`.
    pub async fn find_taken_field(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<&'static str>> {
        if let Some(email) = email {
            let mut query = Users::find().filter(users::Column::Email.eq(email));
            if let Some(id) = exclude_id {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.count(self.conn).await.context("Failed to check email")? > 0 {
                return Ok(Some("email"));
            }
        }

        if let Some(username) = username {
            let mut query = Users::find().filter(users::Column::Username.eq(username));
            if let Some(id) = exclude_id {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query
                .count(self.conn)
                .await
                .context("Failed to check username")?
                > 0
            {
                return Ok(Some("username"));
            }
        }

        Ok(None)
    }

    pub async fn insert(&self, row: UserRow) -> Result<User> {
        let now = chrono::Utc::now();

        let model = users::ActiveModel {
            email: Set(row.email),
            username: Set(row.username),
            password_hash: Set(row.password_hash),
            is_active: Set(true),
            is_superuser: Set(row.is_superuser),
            role: Set(row.role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Applies `changes` and bumps `updated_at`. Returns `None` if the user
    /// does not exist.
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let updated_at = next_timestamp(user.updated_at);

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(hash) = changes.password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(updated_at);

        let model = active
            .update(self.conn)
            .await
            .context("Failed to update user")?;

        Ok(Some(User::from(model)))
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query user for activation change")?
        else {
            return Ok(None);
        };

        let updated_at = next_timestamp(user.updated_at);

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(updated_at);

        let model = active.update(self.conn).await?;
        Ok(Some(User::from(model)))
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<User>> {
        let users = Users::find()
            .order_by_asc(users::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(User::from).collect())
    }
}
