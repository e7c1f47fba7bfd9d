//! Recipes a user marked as favorite.
//!
//! Shares its shape (user + recipe) with the other recipe list; see
//! [`crate::core::toggle::RecipeList`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One recipe favorited by one user
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the list
    pub user_id: i64,
    pub recipe_id: i64,
}

/// Both sides cascade on delete
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade"
    )]
    Recipe,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
