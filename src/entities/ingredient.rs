//! Ingredient entity - A product with its measurement unit ("Salt", "g").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Unit the amounts are given in (e.g. "g", "ml")
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Recipe lines using this ingredient
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
