//! User endpoints: registration, profiles and subscriptions.

use crate::{
    api::{
        AppState,
        auth::{CurrentUser, MaybeUser},
        params::{ListQuery, Paginated},
        serializers::{SubscriptionView, UserView},
        toggle_response,
    },
    core::{
        subscription::get_subscribed_authors,
        toggle::{Association, ToggleAction, toggle},
        user::{self, NewUser},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};

/// `GET /users/`
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    query: ListQuery,
) -> Result<Json<Paginated<UserView>>> {
    let page = query.page()?;
    let (users, count) = user::list_users(&state.database, page).await?;

    let mut views = Vec::with_capacity(users.len());
    for account in users {
        views.push(UserView::build(&state.database, account, viewer.id()).await?);
    }
    Ok(Json(query.paginate(views, count, page)?))
}

/// `POST /users/`
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>)> {
    let Json(new_user) = payload?;
    let created = user::register_user(&state.database, new_user).await?;
    let view = UserView::build(&state.database, created, None).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /users/{id}/`
pub async fn retrieve(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserView>> {
    let account = user::require_user(&state.database, id).await?;
    Ok(Json(UserView::build(&state.database, account, viewer.id()).await?))
}

/// `GET /users/me/`
pub async fn me(State(state): State<AppState>, CurrentUser(me): CurrentUser) -> Result<Json<UserView>> {
    let viewer = Some(me.id);
    Ok(Json(UserView::build(&state.database, me, viewer).await?))
}

/// `GET /users/subscriptions/?recipes_limit=<n>`
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    query: ListQuery,
) -> Result<Json<Paginated<SubscriptionView>>> {
    let page = query.page()?;
    let recipes_limit = query.positive("recipes_limit")?;
    let (authors, count) = get_subscribed_authors(&state.database, me.id, page).await?;

    let mut views = Vec::with_capacity(authors.len());
    for author in authors {
        views.push(SubscriptionView::build(&state.database, author, Some(me.id), recipes_limit).await?);
    }
    Ok(Json(query.paginate(views, count, page)?))
}

/// `POST /users/{id}/subscribe/?recipes_limit=<n>`
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    query: ListQuery,
) -> Result<Response> {
    let recipes_limit = query.positive("recipes_limit")?;
    let toggled = toggle(&state.database, Association::Subscription, id, me.id, ToggleAction::Add).await?;
    toggle_response(&state.database, toggled, me.id, recipes_limit).await
}

/// `DELETE /users/{id}/subscribe/`
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let toggled = toggle(&state.database, Association::Subscription, id, me.id, ToggleAction::Remove).await?;
    toggle_response(&state.database, toggled, me.id, None).await
}
