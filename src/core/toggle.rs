//! Add/remove state machine for user associations.
//!
//! Favorites, the shopping cart and subscriptions all behave the same way:
//! the subject must exist, adding an existing link is a conflict and removing
//! a missing link is an error. Only the target table, the subject entity and
//! the message text differ, so one [`toggle`] function serves all three.

use crate::{
    entities::{Favorite, Recipe, ShoppingCart, Subscription, User, favorite, recipe, shopping_cart, subscription, user},
    errors::{Error, Result},
};
use sea_orm::{
    QuerySelect, Set, SqlErr,
    prelude::*,
    sea_query::{Query, SelectStatement},
};
use tracing::info;

/// The two per-user recipe lists. They share one shape (user + recipe) but
/// live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    /// Recipes the user marked as favorite
    Favorites,
    /// Recipes whose ingredients go on the user's shopping list
    ShoppingCart,
}

impl RecipeList {
    /// Sub-select of the recipe ids `user_id` has in this list.
    #[must_use]
    pub fn recipes_of(self, user_id: i64) -> SelectStatement {
        match self {
            Self::Favorites => Query::select()
                .column(favorite::Column::RecipeId)
                .from(Favorite)
                .and_where(favorite::Column::UserId.eq(user_id))
                .to_owned(),
            Self::ShoppingCart => Query::select()
                .column(shopping_cart::Column::RecipeId)
                .from(ShoppingCart)
                .and_where(shopping_cart::Column::UserId.eq(user_id))
                .to_owned(),
        }
    }

    /// Returns whether `recipe_id` is in the list of `user_id`.
    pub async fn contains<C>(self, db: &C, user_id: i64, recipe_id: i64) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        Ok(find_link(db, Association::Recipes(self), user_id, recipe_id)
            .await?
            .is_some())
    }
}

/// Which association a toggle operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// User to recipe, through one of the recipe lists
    Recipes(RecipeList),
    /// User to the author they follow
    Subscription,
}

impl Association {
    /// Error message for adding a link that already exists.
    #[must_use]
    pub const fn already_linked_message(self) -> &'static str {
        match self {
            Self::Recipes(RecipeList::Favorites) => "Recipe is already in favorites",
            Self::Recipes(RecipeList::ShoppingCart) => "Recipe is already in the shopping cart",
            Self::Subscription => "You are already subscribed to this author",
        }
    }

    /// Error message for removing a link that does not exist.
    #[must_use]
    pub const fn not_linked_message(self) -> &'static str {
        match self {
            Self::Recipes(RecipeList::Favorites) => "Recipe is not in favorites",
            Self::Recipes(RecipeList::ShoppingCart) => "Recipe is not in the shopping cart",
            Self::Subscription => "You are not subscribed to this author",
        }
    }
}

/// Direction of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Create the link (`POST`)
    Add,
    /// Delete the link (`DELETE`)
    Remove,
}

/// The entity on the far side of an association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A favorited or carted recipe
    Recipe(recipe::Model),
    /// A followed author
    Author(user::Model),
}

/// Outcome of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    /// The link was created; carries the subject for the response body.
    Added(Subject),
    /// The link was deleted
    Removed,
}

async fn load_subject(
    db: &DatabaseConnection,
    association: Association,
    subject_id: i64,
) -> Result<Subject> {
    match association {
        Association::Recipes(_) => Recipe::find_by_id(subject_id)
            .one(db)
            .await?
            .map(Subject::Recipe)
            .ok_or(Error::NotFound {
                resource: "Recipe",
                id: subject_id,
            }),
        Association::Subscription => User::find_by_id(subject_id)
            .one(db)
            .await?
            .map(Subject::Author)
            .ok_or(Error::NotFound {
                resource: "User",
                id: subject_id,
            }),
    }
}

/// Id of the row linking `user_id` to `subject_id`, if any.
async fn find_link<C>(
    db: &C,
    association: Association,
    user_id: i64,
    subject_id: i64,
) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let link = match association {
        Association::Recipes(RecipeList::Favorites) => {
            Favorite::find()
                .select_only()
                .column(favorite::Column::Id)
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(subject_id))
                .into_tuple::<i64>()
                .one(db)
                .await?
        }
        Association::Recipes(RecipeList::ShoppingCart) => {
            ShoppingCart::find()
                .select_only()
                .column(shopping_cart::Column::Id)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(subject_id))
                .into_tuple::<i64>()
                .one(db)
                .await?
        }
        Association::Subscription => {
            Subscription::find()
                .select_only()
                .column(subscription::Column::Id)
                .filter(subscription::Column::UserId.eq(user_id))
                .filter(subscription::Column::AuthorId.eq(subject_id))
                .into_tuple::<i64>()
                .one(db)
                .await?
        }
    };
    Ok(link)
}

async fn insert_link(
    db: &DatabaseConnection,
    association: Association,
    user_id: i64,
    subject_id: i64,
) -> std::result::Result<(), DbErr> {
    match association {
        Association::Recipes(RecipeList::Favorites) => {
            favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(subject_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        Association::Recipes(RecipeList::ShoppingCart) => {
            shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(subject_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        Association::Subscription => {
            subscription::ActiveModel {
                user_id: Set(user_id),
                author_id: Set(subject_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

async fn delete_link(db: &DatabaseConnection, association: Association, link_id: i64) -> Result<()> {
    match association {
        Association::Recipes(RecipeList::Favorites) => Favorite::delete_by_id(link_id).exec(db).await?,
        Association::Recipes(RecipeList::ShoppingCart) => {
            ShoppingCart::delete_by_id(link_id).exec(db).await?
        }
        Association::Subscription => Subscription::delete_by_id(link_id).exec(db).await?,
    };
    Ok(())
}

/// Adds or removes the link between `user_id` and the subject `subject_id`.
///
/// Checks run in this order: the subject exists ([`Error::NotFound`]), a user
/// never subscribes to themselves ([`Error::Validation`]), then the link state
/// ([`Error::Conflict`] on a duplicate add, [`Error::NotLinked`] on removing a
/// missing link). A duplicate that slips past the check through a concurrent
/// request hits the unique index and is reported as a conflict as well.
pub async fn toggle(
    db: &DatabaseConnection,
    association: Association,
    subject_id: i64,
    user_id: i64,
    action: ToggleAction,
) -> Result<Toggled> {
    let subject = load_subject(db, association, subject_id).await?;

    if association == Association::Subscription && action == ToggleAction::Add && user_id == subject_id {
        return Err(Error::validation("author", "You cannot subscribe to yourself"));
    }

    let link = find_link(db, association, user_id, subject_id).await?;
    match (action, link) {
        (ToggleAction::Add, Some(_)) => Err(Error::Conflict {
            message: association.already_linked_message().to_string(),
        }),
        (ToggleAction::Add, None) => {
            insert_link(db, association, user_id, subject_id)
                .await
                .map_err(|e| match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict {
                        message: association.already_linked_message().to_string(),
                    },
                    _ => e.into(),
                })?;
            info!(user_id, subject_id, ?association, "Association added");
            Ok(Toggled::Added(subject))
        }
        (ToggleAction::Remove, None) => Err(Error::NotLinked {
            message: association.not_linked_message().to_string(),
        }),
        (ToggleAction::Remove, Some(link_id)) => {
            delete_link(db, association, link_id).await?;
            info!(user_id, subject_id, ?association, "Association removed");
            Ok(Toggled::Removed)
        }
    }
}

/// Returns whether `user_id` follows `author_id`.
pub async fn is_subscribed<C>(db: &C, user_id: i64, author_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(find_link(db, Association::Subscription, user_id, author_id)
        .await?
        .is_some())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const FAVORITES: Association = Association::Recipes(RecipeList::Favorites);
    const CART: Association = Association::Recipes(RecipeList::ShoppingCart);

    #[tokio::test]
    async fn test_favorite_add_twice_conflicts() -> Result<()> {
        let (db, user, recipe) = setup_with_recipe().await?;

        let first = toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Add).await?;
        assert_eq!(first, Toggled::Added(Subject::Recipe(recipe.clone())));
        assert!(RecipeList::Favorites.contains(&db, user.id, recipe.id).await?);

        let second = toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Add).await;
        assert!(matches!(second, Err(Error::Conflict { ref message }) if message == "Recipe is already in favorites"));

        Ok(())
    }

    #[tokio::test]
    async fn test_favorite_add_remove_remove() -> Result<()> {
        let (db, user, recipe) = setup_with_recipe().await?;

        toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Add).await?;
        let removed = toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Remove).await?;
        assert_eq!(removed, Toggled::Removed);
        assert!(!RecipeList::Favorites.contains(&db, user.id, recipe.id).await?);

        let again = toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Remove).await;
        assert!(matches!(again, Err(Error::NotLinked { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_subject_is_not_found_before_link_checks() -> Result<()> {
        let (db, user, _) = setup_with_recipe().await?;

        for action in [ToggleAction::Add, ToggleAction::Remove] {
            let result = toggle(&db, CART, 9999, user.id, action).await;
            assert!(matches!(result, Err(Error::NotFound { resource: "Recipe", id: 9999 })));
        }
        let result = toggle(&db, Association::Subscription, 9999, user.id, ToggleAction::Add).await;
        assert!(matches!(result, Err(Error::NotFound { resource: "User", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_lists_are_independent() -> Result<()> {
        let (db, user, recipe) = setup_with_recipe().await?;

        toggle(&db, CART, recipe.id, user.id, ToggleAction::Add).await?;
        assert!(RecipeList::ShoppingCart.contains(&db, user.id, recipe.id).await?);
        assert!(!RecipeList::Favorites.contains(&db, user.id, recipe.id).await?);

        // the cart entry does not make the favorite add a conflict
        toggle(&db, FAVORITES, recipe.id, user.id, ToggleAction::Add).await?;
        let result = toggle(&db, CART, recipe.id, user.id, ToggleAction::Add).await;
        assert!(matches!(result, Err(Error::Conflict { ref message }) if message.contains("shopping cart")));

        Ok(())
    }

    #[tokio::test]
    async fn test_self_subscription_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;

        let result = toggle(&db, Association::Subscription, user.id, user.id, ToggleAction::Add).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(!is_subscribed(&db, user.id, user.id).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;

        let added = toggle(&db, Association::Subscription, bob.id, alice.id, ToggleAction::Add).await?;
        assert_eq!(added, Toggled::Added(Subject::Author(bob.clone())));
        assert!(is_subscribed(&db, alice.id, bob.id).await?);
        assert!(!is_subscribed(&db, bob.id, alice.id).await?);

        let duplicate = toggle(&db, Association::Subscription, bob.id, alice.id, ToggleAction::Add).await;
        assert!(matches!(duplicate, Err(Error::Conflict { .. })));

        toggle(&db, Association::Subscription, bob.id, alice.id, ToggleAction::Remove).await?;
        assert!(!is_subscribed(&db, alice.id, bob.id).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_insert() -> Result<()> {
        let (db, user, recipe) = setup_with_recipe().await?;

        insert_link(&db, CART, user.id, recipe.id).await?;
        let err = insert_link(&db, CART, user.id, recipe.id).await.unwrap_err();
        assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));

        Ok(())
    }
}
