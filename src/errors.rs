//! Unified error type for the whole crate.
//!
//! Domain failures (validation, conflicts, missing rows, permissions) and
//! infrastructure failures share one enum so that core functions can use `?`
//! freely. The HTTP layer maps each variant to a status code in
//! [`crate::api::error`].

use thiserror::Error;

/// Every failure the crate reports, from infrastructure to request validation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// argon2 failed to hash a password.
    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },

    /// A field is missing or carries an invalid value.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The association being added already exists.
    #[error("{message}")]
    Conflict { message: String },

    /// The association being removed does not exist.
    #[error("{message}")]
    NotLinked { message: String },

    /// No `resource` row with this id; also used for out-of-range pages.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Only the author may change a recipe.
    #[error("You do not have permission to perform this action")]
    PermissionDenied,

    /// Missing or unknown API token.
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,
}

impl Error {
    /// Shorthand for a [`Error::Validation`] on `field`.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
