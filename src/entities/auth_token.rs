//! Auth token entity - Maps an opaque API key to its user.
//!
//! Tokens are provisioned by the authentication service that shares this
//! database; the API only resolves them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    /// The key sent in `Authorization: Token <key>`
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Owner of the token
    pub user_id: i64,
    /// When the token was issued
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
