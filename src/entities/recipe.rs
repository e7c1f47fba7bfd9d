//! Recipe entity - A published recipe owned by its author.
//!
//! Tags and ingredients live in the `recipe_tags` and `recipe_ingredients`
//! junction tables. The default listing order is newest first (id descending).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    /// Unique identifier for the recipe
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who published the recipe
    pub author_id: i64,
    /// Title shown in listings
    pub name: String,
    /// Preparation instructions
    pub text: String,
    /// Image payload as received from the client (usually a base64 data URI)
    pub image: String,
    /// Cooking time in minutes, at least 1
    pub cooking_time: i32,
}

/// Defines relationships between Recipe and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recipe belongs to one author
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    /// Tag links, removed with the recipe
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
    #[sea_orm(has_many = "super::shopping_cart::Entity")]
    ShoppingCarts,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::shopping_cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoppingCarts.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
