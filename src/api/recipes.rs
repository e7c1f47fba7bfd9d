//! Recipe endpoints, including the favorite and shopping cart toggles and the
//! shopping list download.

use crate::{
    api::{
        AppState,
        auth::{CurrentUser, MaybeUser},
        params::{ListQuery, Paginated},
        serializers::RecipeView,
        toggle_response,
    },
    core::{
        filter::RecipeFilter,
        recipe::{self, RecipePatch},
        shopping_list::{get_shopping_list, render_shopping_list},
        toggle::{Association, RecipeList, ToggleAction, toggle},
    },
    entities::user,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

/// `GET /recipes/?author=&tags=&is_favorited=&is_in_shopping_cart=`
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    query: ListQuery,
) -> Result<Json<Paginated<RecipeView>>> {
    let filter = RecipeFilter {
        author: query.id("author")?,
        tags: query.get_all("tags"),
        is_favorited: query.flag("is_favorited")?,
        is_in_shopping_cart: query.flag("is_in_shopping_cart")?,
    };
    let page = query.page()?;

    let (recipes, count) = recipe::list_recipes(&state.database, &filter, viewer.id(), page).await?;
    let views = RecipeView::build_all(&state.database, recipes, viewer.id()).await?;
    Ok(Json(query.paginate(views, count, page)?))
}

/// `POST /recipes/`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    payload: std::result::Result<Json<RecipePatch>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeView>)> {
    let Json(draft) = payload?;
    let created = recipe::create_recipe(&state.database, me.id, draft.into()).await?;
    let view = RecipeView::build(&state.database, created, Some(me.id)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /recipes/{id}/`
pub async fn retrieve(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeView>> {
    let found = recipe::require_recipe(&state.database, id).await?;
    Ok(Json(RecipeView::build(&state.database, found, viewer.id()).await?))
}

/// `PATCH /recipes/{id}/`
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<RecipePatch>, JsonRejection>,
) -> Result<Json<RecipeView>> {
    let Json(patch) = payload?;
    let updated = recipe::update_recipe(&state.database, id, me.id, patch).await?;
    Ok(Json(RecipeView::build(&state.database, updated, Some(me.id)).await?))
}

/// `DELETE /recipes/{id}/`
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    recipe::delete_recipe(&state.database, id, me.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_list(
    state: &AppState,
    me: &user::Model,
    recipe_id: i64,
    list: RecipeList,
    action: ToggleAction,
) -> Result<Response> {
    let toggled = toggle(&state.database, Association::Recipes(list), recipe_id, me.id, action).await?;
    toggle_response(&state.database, toggled, me.id, None).await
}

/// `POST /recipes/{id}/favorite/`
pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    toggle_list(&state, &me, id, RecipeList::Favorites, ToggleAction::Add).await
}

/// `DELETE /recipes/{id}/favorite/`
pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    toggle_list(&state, &me, id, RecipeList::Favorites, ToggleAction::Remove).await
}

/// `POST /recipes/{id}/shopping_cart/`
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    toggle_list(&state, &me, id, RecipeList::ShoppingCart, ToggleAction::Add).await
}

/// `DELETE /recipes/{id}/shopping_cart/`
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    toggle_list(&state, &me, id, RecipeList::ShoppingCart, ToggleAction::Remove).await
}

/// `GET /recipes/download_shopping_cart/`
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> Result<Response> {
    let items = get_shopping_list(&state.database, me.id).await?;
    info!(user_id = me.id, lines = items.len(), "Shopping list downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        render_shopping_list(&items),
    )
        .into_response())
}
