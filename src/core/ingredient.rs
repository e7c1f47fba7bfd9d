//! Ingredient business logic - name-prefix search and get-or-create for seeding.

use crate::{
    core::filter::IngredientFilter,
    entities::{Ingredient, ingredient},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Lists ingredients matching `filter`, ordered alphabetically by name.
pub async fn search_ingredients(
    db: &DatabaseConnection,
    filter: &IngredientFilter,
) -> Result<Vec<ingredient::Model>> {
    filter
        .apply(Ingredient::find())
        .order_by_asc(ingredient::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an ingredient by id.
pub async fn get_ingredient_by_id(
    db: &DatabaseConnection,
    ingredient_id: i64,
) -> Result<Option<ingredient::Model>> {
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the ingredient with this exact name and unit, creating it when absent.
pub async fn get_or_create_ingredient(
    db: &DatabaseConnection,
    name: &str,
    measurement_unit: &str,
) -> Result<ingredient::Model> {
    let name = name.trim();
    let measurement_unit = measurement_unit.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "Ingredient name cannot be empty"));
    }
    if measurement_unit.is_empty() {
        return Err(Error::validation(
            "measurement_unit",
            "Measurement unit cannot be empty",
        ));
    }

    if let Some(existing) = Ingredient::find()
        .filter(ingredient::Column::Name.eq(name))
        .filter(ingredient::Column::MeasurementUnit.eq(measurement_unit))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let ingredient = ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(measurement_unit.to_string()),
        ..Default::default()
    };
    ingredient.insert(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_search_by_prefix() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ingredient(&db, "Sugar", "g").await?;
        create_test_ingredient(&db, "Salt", "g").await?;
        create_test_ingredient(&db, "Basil salt", "g").await?;

        let filter = IngredientFilter {
            name: Some("Sa".to_string()),
        };
        let found = search_ingredients(&db, &filter).await?;
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Salt"]);

        let all = search_ingredients(&db, &IngredientFilter::default()).await?;
        let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Basil salt", "Salt", "Sugar"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_same_name_different_unit_is_distinct() -> Result<()> {
        let db = setup_test_db().await?;
        let grams = get_or_create_ingredient(&db, "Milk", "g").await?;
        let millis = get_or_create_ingredient(&db, "Milk", "ml").await?;
        let again = get_or_create_ingredient(&db, "Milk", "ml").await?;

        assert_ne!(grams.id, millis.id);
        assert_eq!(millis.id, again.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_ingredient_by_id_missing() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_ingredient_by_id(&db, 7).await?.is_none());
        Ok(())
    }
}
