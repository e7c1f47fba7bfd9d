//! Reference data seeding from a TOML file.
//!
//! Tags and ingredients are not created through the API. An operator lists them
//! in a TOML file (see `SEED_FILE`) which is applied at startup with
//! get-or-create semantics, so re-running the seed never duplicates rows.

use crate::{
    core::{ingredient, tag},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the whole seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    /// Ingredients to create when missing
    #[serde(default)]
    pub ingredients: Vec<IngredientSeed>,
    /// Tags to create when missing
    #[serde(default)]
    pub tags: Vec<TagSeed>,
}

/// One `[[ingredients]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

/// One `[[tags]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct TagSeed {
    pub name: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
    pub slug: String,
}

/// Loads seed data from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<SeedData> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seed file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Inserts every tag and ingredient of `seed` that is not stored yet.
///
/// Returns the number of ingredients and tags processed.
pub async fn apply_seed(db: &DatabaseConnection, seed: &SeedData) -> Result<(usize, usize)> {
    for item in &seed.ingredients {
        ingredient::get_or_create_ingredient(db, &item.name, &item.measurement_unit).await?;
    }
    for item in &seed.tags {
        tag::get_or_create_tag(db, &item.name, &item.color, &item.slug).await?;
    }

    info!(
        ingredients = seed.ingredients.len(),
        tags = seed.tags.len(),
        "Reference data seeded"
    );
    Ok((seed.ingredients.len(), seed.tags.len()))
}
