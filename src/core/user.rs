//! User business logic - registration, lookups and API token resolution.
//!
//! Passwords are stored as argon2 PHC strings. Issuing tokens is handled by the
//! authentication service; this module only resolves an existing key to its user.

use crate::{
    core::{PageRequest, fetch_page},
    entities::{AuthToken, User, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub email: String,
    /// Letters, digits and `@.+-_` only
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Plain text; hashed before it is stored
    pub password: String,
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Checks the registration payload field by field, stopping at the first problem.
pub fn validate_new_user(new_user: &NewUser) -> Result<()> {
    let email = new_user.email.trim();
    if email.is_empty() {
        return Err(Error::validation("email", "E-mail cannot be empty"));
    }
    if !email.contains('@') || email.len() > 254 {
        return Err(Error::validation("email", "Enter a valid e-mail address"));
    }

    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(Error::validation("username", "Username cannot be empty"));
    }
    if username.chars().count() > 150 || !is_valid_username(username) {
        return Err(Error::validation(
            "username",
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }

    if new_user.first_name.trim().is_empty() {
        return Err(Error::validation("first_name", "First name cannot be empty"));
    }
    if new_user.last_name.trim().is_empty() {
        return Err(Error::validation("last_name", "Last name cannot be empty"));
    }
    if new_user.password.is_empty() {
        return Err(Error::validation("password", "Password cannot be empty"));
    }

    Ok(())
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Creates a new account after validating the payload.
///
/// # Errors
/// Returns an error if:
/// - A field is empty or malformed
/// - The e-mail or username is already taken
/// - The database insert fails
pub async fn register_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    validate_new_user(&new_user)?;

    let email = new_user.email.trim().to_string();
    let username = new_user.username.trim().to_string();

    let taken = User::find()
        .filter(
            user::Column::Email
                .eq(email.as_str())
                .or(user::Column::Username.eq(username.as_str())),
        )
        .one(db)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.email == email {
            "email"
        } else {
            "username"
        };
        return Err(Error::Conflict {
            message: format!("A user with this {field} already exists"),
        });
    }

    let account = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        first_name: Set(new_user.first_name.trim().to_string()),
        last_name: Set(new_user.last_name.trim().to_string()),
        password: Set(hash_password(&new_user.password)?),
        date_joined: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = account.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict {
            message: "A user with this e-mail or username already exists".to_string(),
        },
        _ => e.into(),
    })?;
    info!(user_id = created.id, "Registered user {}", created.username);
    Ok(created)
}

/// Finds a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by id or fails with [`Error::NotFound`].
pub async fn require_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::NotFound {
            resource: "User",
            id: user_id,
        })
}

/// Resolves an API token key to the user owning it.
pub async fn get_user_by_token(db: &DatabaseConnection, key: &str) -> Result<Option<user::Model>> {
    let Some(token) = AuthToken::find_by_id(key.to_string()).one(db).await? else {
        return Ok(None);
    };
    get_user_by_id(db, token.user_id).await
}

/// Lists users ordered by id, one page at a time.
pub async fn list_users(
    db: &DatabaseConnection,
    page: PageRequest,
) -> Result<(Vec<user::Model>, u64)> {
    fetch_page(db, User::find().order_by_asc(user::Column::Id), page).await
}
