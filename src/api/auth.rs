//! Token authentication extractors.
//!
//! Requests carry `Authorization: Token <key>`. No header means an anonymous
//! request; a header with an unknown or malformed key is rejected outright.

use crate::{
    api::AppState,
    core::user::get_user_by_token,
    entities::user,
    errors::{Error, Result},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

/// The authenticated user; rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// The user behind the request, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

impl MaybeUser {
    /// Id of the viewer, `None` when anonymous.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

fn token_key(parts: &Parts) -> Result<Option<&str>> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| Error::Unauthenticated)?;
    value
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(Some)
        .ok_or(Error::Unauthenticated)
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(key) = token_key(parts)? else {
            return Ok(Self(None));
        };
        match get_user_by_token(&state.database, key).await? {
            Some(user) => Ok(Self(Some(user))),
            None => {
                debug!("Rejected unknown API token");
                Err(Error::Unauthenticated)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        MaybeUser::from_request_parts(parts, state)
            .await?
            .0
            .map(Self)
            .ok_or(Error::Unauthenticated)
    }
}
