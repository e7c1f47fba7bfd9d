//! Declarative list filters.
//!
//! Each filter is a plain struct built from request parameters and applied to a
//! `Select` by adding `WHERE` clauses. Membership conditions use `IN (subquery)`
//! so a recipe never appears twice in a result, whatever it is joined to.

use crate::{
    core::toggle::RecipeList,
    entities::{Ingredient, Recipe, RecipeTag, Tag, ingredient, recipe, recipe_tag, tag},
};
use sea_orm::{
    ColumnTrait, QueryFilter, Select,
    sea_query::{Expr, LikeExpr, Query},
};

/// Filters for the ingredient search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientFilter {
    /// Name prefix
    pub name: Option<String>,
}

impl IngredientFilter {
    /// Keeps ingredients whose name starts with `name`, taken literally.
    #[must_use]
    pub fn apply(&self, query: Select<Ingredient>) -> Select<Ingredient> {
        match self.name.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                let pattern = format!("{}%", escape_like(prefix));
                query.filter(
                    Expr::col((Ingredient, ingredient::Column::Name))
                        .like(LikeExpr::new(pattern).escape('\\')),
                )
            }
            _ => query,
        }
    }
}

/// Escapes the `LIKE` wildcards in `text` with a backslash.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Filters for the recipe list.
///
/// `is_favorited` and `is_in_shopping_cart` only ever narrow the result: a
/// `false` value is the same as not filtering at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Exact author id
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches when it carries any of them
    pub tags: Vec<String>,
    /// Only recipes in the viewer's favorites
    pub is_favorited: bool,
    /// Only recipes in the viewer's shopping cart
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    /// Restricts `query` for a request made by `viewer` (`None` when anonymous).
    ///
    /// The list flags match nothing for anonymous viewers, who have no lists.
    #[must_use]
    pub fn apply(&self, mut query: Select<Recipe>, viewer: Option<i64>) -> Select<Recipe> {
        if let Some(author_id) = self.author {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }

        if !self.tags.is_empty() {
            let tagged = Query::select()
                .column((RecipeTag, recipe_tag::Column::RecipeId))
                .from(RecipeTag)
                .inner_join(
                    Tag,
                    Expr::col((Tag, tag::Column::Id)).equals((RecipeTag, recipe_tag::Column::TagId)),
                )
                .and_where(tag::Column::Slug.is_in(self.tags.iter().map(String::as_str)))
                .to_owned();
            query = query.filter(recipe::Column::Id.in_subquery(tagged));
        }

        for (enabled, list) in [
            (self.is_favorited, RecipeList::Favorites),
            (self.is_in_shopping_cart, RecipeList::ShoppingCart),
        ] {
            if !enabled {
                continue;
            }
            query = match viewer {
                Some(user_id) => query.filter(recipe::Column::Id.in_subquery(list.recipes_of(user_id))),
                None => query.filter(recipe::Column::Id.is_in(Vec::<i64>::new())),
            };
        }

        query
    }
}

/// Parses a query-string boolean (`1`/`0`, `true`/`false`).
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
