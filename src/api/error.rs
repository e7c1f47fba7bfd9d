//! HTTP mapping of the crate error type.
//!
//! Every handler returns [`crate::errors::Result`], so this is the single
//! place where errors turn into status codes and JSON bodies.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// Status code the variant is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict { .. } | Self::NotLinked { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::IntConversion(_)
            | Self::PasswordHash { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation { field, message } => json!({ "field": field, "message": message }),
            _ if status.is_server_error() => {
                error!("Request failed: {self}");
                json!({ "message": "Internal server error" })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", rejection.body_text())
    }
}
