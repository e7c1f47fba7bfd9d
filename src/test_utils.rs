//! Shared test utilities for the recipe backend.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    api::{self, AppState},
    config::AppConfig,
    core::recipe::{self, IngredientAmount, RecipeDraft},
    entities::{self, auth_token, ingredient, tag, user},
    errors::Result,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user named `username`.
///
/// # Defaults
/// * `email`: `"{username}@example.com"`
/// * `first_name` / `last_name`: `"Test"` / `"User"`
/// * `password`: an unusable placeholder, test users never log in
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    user::ActiveModel {
        email: Set(format!("{username}@example.com")),
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        password: Set("!".to_string()),
        date_joined: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Stores an API token `key` for `user_id`.
pub async fn create_test_token(
    db: &DatabaseConnection,
    user_id: i64,
    key: &str,
) -> Result<auth_token::Model> {
    auth_token::ActiveModel {
        key: Set(key.to_string()),
        user_id: Set(user_id),
        created: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a tag whose name is the slug and whose color is derived from it,
/// so distinct slugs get distinct colors.
pub async fn create_test_tag(db: &DatabaseConnection, slug: &str) -> Result<tag::Model> {
    let hash = slug
        .bytes()
        .fold(0x81_1C9D_u32, |acc, b| acc.wrapping_mul(0x0100_0193) ^ u32::from(b));
    tag::ActiveModel {
        name: Set(slug.to_string()),
        color: Set(format!("#{:06X}", hash & 0x00FF_FFFF)),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an ingredient measured in `unit`.
pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    unit: &str,
) -> Result<ingredient::Model> {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a recipe through the regular creation path.
///
/// # Defaults
/// * `text`: `"Test recipe"`
/// * `image`: a tiny data URI
/// * `cooking_time`: 10
pub async fn create_test_recipe(
    db: &DatabaseConnection,
    author_id: i64,
    name: &str,
    tags: &[i64],
    ingredients: &[(i64, i32)],
) -> Result<entities::recipe::Model> {
    let draft = RecipeDraft {
        name: name.to_string(),
        text: "Test recipe".to_string(),
        image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        cooking_time: 10,
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|&(ingredient_id, amount)| IngredientAmount {
                ingredient_id,
                amount,
            })
            .collect(),
    };
    recipe::create_recipe(db, author_id, draft).await
}

/// Sets up a complete test environment with one user owning one recipe.
/// The recipe has a single tag and a single ingredient (5 g of salt).
/// Returns (db, author, recipe).
pub async fn setup_with_recipe() -> Result<(DatabaseConnection, user::Model, entities::recipe::Model)>
{
    let db = setup_test_db().await?;
    let author = create_test_user(&db, "author").await?;
    let tag = create_test_tag(&db, "dinner").await?;
    let salt = create_test_ingredient(&db, "Salt", "g").await?;
    let recipe = create_test_recipe(&db, author.id, "Test Recipe", &[tag.id], &[(salt.id, 5)]).await?;
    Ok((db, author, recipe))
}

/// Builds the full API router over `db` with default configuration.
pub fn test_app(db: DatabaseConnection) -> Router {
    api::router(AppState {
        database: db,
        config: Arc::new(AppConfig::default()),
    })
}

/// Builds a request with an optional `Token` header and JSON body.
#[allow(clippy::unwrap_used)]
pub fn api_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {key}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Sends `request` through `app` and returns the status with the raw body.
#[allow(clippy::unwrap_used)]
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

/// Sends `request` through `app` and parses the body as JSON (`Null` when empty).
#[allow(clippy::unwrap_used)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, request).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
