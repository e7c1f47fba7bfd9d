//! Read-only tag endpoints. Tags are never paginated.

use crate::{
    api::AppState,
    core::tag::{get_all_tags, get_tag_by_id},
    entities::tag,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /tags/`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<tag::Model>>> {
    Ok(Json(get_all_tags(&state.database).await?))
}

/// `GET /tags/{id}/`
pub async fn retrieve(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<tag::Model>> {
    get_tag_by_id(&state.database, id)
        .await?
        .map(Json)
        .ok_or(Error::NotFound { resource: "Tag", id })
}
