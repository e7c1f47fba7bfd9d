//! Database configuration module.
//!
//! This module handles the `SQLite` database connection and schema creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the foreign keys (all `ON DELETE CASCADE`) follow the `Relation` enums. Composite
//! uniqueness on the association tables is added as separate unique indexes.

use crate::entities::{
    AuthToken, Favorite, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCart,
    Subscription, Tag, User, favorite, recipe_tag, shopping_cart, subscription,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use tracing::{debug, info};

/// Default database location used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/foodgram.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table and unique index if they do not exist yet.
///
/// Tables are created parents first so that foreign keys always reference an
/// existing table.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, AuthToken).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Recipe).await?;
    create_table(db, &schema, RecipeTag).await?;
    create_table(db, &schema, RecipeIngredient).await?;
    create_table(db, &schema, Favorite).await?;
    create_table(db, &schema, ShoppingCart).await?;
    create_table(db, &schema, Subscription).await?;

    let unique_indexes = [
        Index::create()
            .name("uq_recipe_tags_recipe_tag")
            .table(RecipeTag)
            .col(recipe_tag::Column::RecipeId)
            .col(recipe_tag::Column::TagId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_favorites_user_recipe")
            .table(Favorite)
            .col(favorite::Column::UserId)
            .col(favorite::Column::RecipeId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_shopping_carts_user_recipe")
            .table(ShoppingCart)
            .col(shopping_cart::Column::UserId)
            .col(shopping_cart::Column::RecipeId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_subscriptions_user_author")
            .table(Subscription)
            .col(subscription::Column::UserId)
            .col(subscription::Column::AuthorId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ];
    for index in &unique_indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Database schema is up to date");
    Ok(())
}
