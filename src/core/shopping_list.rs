//! Shopping list aggregation.
//!
//! Sums the ingredient amounts of every recipe in a user's shopping cart,
//! grouped by ingredient name and measurement unit, and renders the result as
//! plain text for download.

use crate::{
    core::toggle::RecipeList,
    entities::{Ingredient, RecipeIngredient, ingredient, recipe_ingredient},
    errors::Result,
};
use sea_orm::{FromQueryResult, QueryOrder, QuerySelect, prelude::*};
use std::fmt::Write as _;

/// First line of every rendered shopping list.
pub const SHOPPING_LIST_HEADER: &str = "Ваш список покупок:";

/// One aggregated line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListItem {
    /// Ingredient name
    pub name: String,
    pub measurement_unit: String,
    /// Sum of the amounts over all recipes in the cart
    pub total: i64,
}

/// Aggregates the ingredients of all recipes in `user_id`'s cart, sorted by name.
///
/// The grouping key includes the unit, so the same name measured in two units
/// yields two lines.
pub async fn get_shopping_list(db: &DatabaseConnection, user_id: i64) -> Result<Vec<ShoppingListItem>> {
    RecipeIngredient::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(recipe_ingredient::Column::Amount.sum(), "total")
        .inner_join(Ingredient)
        .filter(
            recipe_ingredient::Column::RecipeId
                .in_subquery(RecipeList::ShoppingCart.recipes_of(user_id)),
        )
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .into_model::<ShoppingListItem>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renders the header followed by one `"{name} - {total} {unit}"` line per item.
#[must_use]
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut text = format!("{SHOPPING_LIST_HEADER}\n");
    for item in items {
        // Writing to a String cannot fail
        let _ = writeln!(text, "{} - {} {}", item.name, item.total, item.measurement_unit);
    }
    text
}
