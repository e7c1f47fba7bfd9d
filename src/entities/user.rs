//! User entity - Represents a registered account.
//!
//! Users log in by e-mail, author recipes, and own favorites, shopping cart
//! entries, and subscriptions. Deleting a user cascades to everything they own.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login identifier
    #[sea_orm(unique)]
    pub email: String,
    /// Public handle shown next to recipes
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string, never serialized to clients
    #[serde(skip_serializing)]
    pub password: String,
    /// When the account was registered
    pub date_joined: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user authors many recipes
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,
    /// One user owns many API tokens
    #[sea_orm(has_many = "super::auth_token::Entity")]
    AuthTokens,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
