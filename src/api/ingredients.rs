//! Read-only ingredient endpoints with name-prefix search.

use crate::{
    api::{AppState, params::ListQuery},
    core::{
        filter::IngredientFilter,
        ingredient::{get_ingredient_by_id, search_ingredients},
    },
    entities::ingredient,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /ingredients/?name=<prefix>`
pub async fn list(
    State(state): State<AppState>,
    query: ListQuery,
) -> Result<Json<Vec<ingredient::Model>>> {
    let filter = IngredientFilter {
        name: query.get("name").map(str::to_string),
    };
    Ok(Json(search_ingredients(&state.database, &filter).await?))
}

/// `GET /ingredients/{id}/`
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ingredient::Model>> {
    get_ingredient_by_id(&state.database, id)
        .await?
        .map(Json)
        .ok_or(Error::NotFound {
            resource: "Ingredient",
            id,
        })
}

#[cfg(test)]
mod tests {
    use crate::{errors::Result, test_utils::*};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_search_by_prefix() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ingredient(&db, "Sugar", "g").await?;
        create_test_ingredient(&db, "Salt", "g").await?;
        create_test_ingredient(&db, "Pepper", "g").await?;
        let app = test_app(db);

        let (status, body) = send(&app, api_request(Method::GET, "/ingredients/?name=S", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Salt");
        assert_eq!(body[1]["name"], "Sugar");
        assert_eq!(body[0]["measurement_unit"], "g");
        assert!(body[2].is_null());

        let (_, all) = send(&app, api_request(Method::GET, "/ingredients/", None, None)).await;
        assert_eq!(all.as_array().map(Vec::len), Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn test_wildcards_in_name_match_literally() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ingredient(&db, "Salt", "g").await?;
        create_test_ingredient(&db, "Sugar", "g").await?;
        create_test_ingredient(&db, "100% juice", "ml").await?;
        let app = test_app(db);

        let (status, body) = send(&app, api_request(Method::GET, "/ingredients/?name=%25", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (_, body) = send(&app, api_request(Method::GET, "/ingredients/?name=100%25", None, None)).await;
        assert_eq!(body[0]["name"], "100% juice");
        assert!(body[1].is_null());

        let (_, body) = send(&app, api_request(Method::GET, "/ingredients/?name=_a", None, None)).await;
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_missing_ingredient() -> Result<()> {
        let app = test_app(setup_test_db().await?);
        let (status, _) = send(&app, api_request(Method::GET, "/ingredients/12/", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
