//! Tag entity - Named, colored labels attached to recipes (e.g. "Breakfast").
//!
//! Name, color and slug are each unique; recipes are filtered by slug.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    /// Hex color in `#RRGGBB` form
    #[sea_orm(unique)]
    pub color: String,
    /// URL-safe identifier used by the `tags` filter
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Recipe.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
