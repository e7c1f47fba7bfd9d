//! JSON views of the domain models.
//!
//! Views that depend on who is looking (`is_subscribed`, `is_favorited`,
//! `is_in_shopping_cart`) take the viewer's id explicitly; `None` means an
//! anonymous request and every such flag is `false`.

use crate::{
    core::{
        recipe::{RecipeIngredientLine, count_author_recipes, get_author_recipes, get_recipe_ingredients},
        tag::get_recipe_tags,
        toggle::{RecipeList, is_subscribed},
        user::require_user,
    },
    entities::{recipe, tag, user},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user
    pub is_subscribed: bool,
}

impl UserView {
    /// Profile of `user` as seen by `viewer`.
    pub async fn build(db: &DatabaseConnection, user: user::Model, viewer: Option<i64>) -> Result<Self> {
        let is_subscribed = match viewer {
            Some(viewer_id) => is_subscribed(db, viewer_id, user.id).await?,
            None => false,
        };
        Ok(Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        })
    }
}

/// Compact recipe used in subscription listings and toggle responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeShort {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Full recipe as returned by the recipe endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub tags: Vec<tag::Model>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    /// Loads the tags, ingredients and author of `recipe` and the viewer's
    /// list flags for it.
    pub async fn build(
        db: &DatabaseConnection,
        recipe: recipe::Model,
        viewer: Option<i64>,
    ) -> Result<Self> {
        let author = require_user(db, recipe.author_id).await?;

        let (is_favorited, is_in_shopping_cart) = match viewer {
            Some(viewer_id) => (
                RecipeList::Favorites.contains(db, viewer_id, recipe.id).await?,
                RecipeList::ShoppingCart.contains(db, viewer_id, recipe.id).await?,
            ),
            None => (false, false),
        };

        Ok(Self {
            id: recipe.id,
            tags: get_recipe_tags(db, recipe.id).await?,
            author: UserView::build(db, author, viewer).await?,
            ingredients: get_recipe_ingredients(db, recipe.id).await?,
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        })
    }

    /// Builds views for a page of recipes, keeping their order.
    pub async fn build_all(
        db: &DatabaseConnection,
        recipes: Vec<recipe::Model>,
        viewer: Option<i64>,
    ) -> Result<Vec<Self>> {
        let mut views = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            views.push(Self::build(db, recipe, viewer).await?);
        }
        Ok(views)
    }
}

/// An author as seen from the subscriptions list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    /// The newest recipes, at most `recipes_limit` of them
    pub recipes: Vec<RecipeShort>,
    /// All recipes of the author, regardless of the limit
    pub recipes_count: u64,
}

impl SubscriptionView {
    /// `author` with their newest recipes, capped by `recipes_limit` when given.
    pub async fn build(
        db: &DatabaseConnection,
        author: user::Model,
        viewer: Option<i64>,
        recipes_limit: Option<u64>,
    ) -> Result<Self> {
        let recipes = get_author_recipes(db, author.id, recipes_limit).await?;
        let recipes_count = count_author_recipes(db, author.id).await?;
        Ok(Self {
            author: UserView::build(db, author, viewer).await?,
            recipes: recipes.into_iter().map(RecipeShort::from).collect(),
            recipes_count,
        })
    }
}
