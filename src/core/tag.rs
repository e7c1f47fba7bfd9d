//! Tag business logic - lookups and get-or-create for seeding.

use crate::{
    entities::{RecipeTag, Tag, recipe_tag, tag},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Returns whether `color` is a `#RRGGBB` hex color.
#[must_use]
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Returns whether `slug` is non-empty and made of ASCII letters, digits, `-` and `_`.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Retrieves all tags ordered by id.
pub async fn get_all_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>> {
    Tag::find()
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a tag by id.
pub async fn get_tag_by_id(db: &DatabaseConnection, tag_id: i64) -> Result<Option<tag::Model>> {
    Tag::find_by_id(tag_id).one(db).await.map_err(Into::into)
}

/// Retrieves the tags attached to a recipe, ordered by id.
pub async fn get_recipe_tags<C>(db: &C, recipe_id: i64) -> Result<Vec<tag::Model>>
where
    C: ConnectionTrait,
{
    let tag_ids = RecipeTag::find()
        .select_only()
        .column(recipe_tag::Column::TagId)
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .into_tuple::<i64>()
        .all(db)
        .await?;

    Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the tag matching `slug`, creating it with `name` and `color` when absent.
///
/// # Errors
/// Returns an error if the name is empty, the color is not `#RRGGBB`, the slug
/// contains invalid characters, or another tag already uses the name or color.
pub async fn get_or_create_tag(
    db: &DatabaseConnection,
    name: &str,
    color: &str,
    slug: &str,
) -> Result<tag::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "Tag name cannot be empty"));
    }
    if !is_hex_color(color) {
        return Err(Error::validation(
            "color",
            format!("'{color}' is not a #RRGGBB color"),
        ));
    }
    if !is_valid_slug(slug) {
        return Err(Error::validation(
            "slug",
            format!("'{slug}' is not a valid slug"),
        ));
    }

    if let Some(existing) = Tag::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let tag = tag::ActiveModel {
        name: Set(name.trim().to_string()),
        color: Set(color.to_uppercase()),
        slug: Set(slug.to_string()),
        ..Default::default()
    };
    tag.insert(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_color_and_slug_rules() {
        assert!(is_hex_color("#49B64E"));
        assert!(is_hex_color("#abcdef"));
        assert!(!is_hex_color("49B64E"));
        assert!(!is_hex_color("#49B64"));
        assert!(!is_hex_color("#49B64G"));

        assert!(is_valid_slug("breakfast"));
        assert!(is_valid_slug("late_dinner-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("with space"));
    }

    #[tokio::test]
    async fn test_get_or_create_tag_reuses_slug() -> Result<()> {
        let db = setup_test_db().await?;

        let first = get_or_create_tag(&db, "Lunch", "#E26C2D", "lunch").await?;
        let second = get_or_create_tag(&db, "Lunch", "#E26C2D", "lunch").await?;
        assert_eq!(first.id, second.id);
        assert_eq!(get_all_tags(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_tag_rejects_bad_color() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_or_create_tag(&db, "Lunch", "orange", "lunch").await;
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "color"));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_tags_ordered_by_id() -> Result<()> {
        let db = setup_test_db().await?;
        let dinner = create_test_tag(&db, "dinner").await?;
        let breakfast = create_test_tag(&db, "breakfast").await?;

        let tags = get_all_tags(&db).await?;
        assert_eq!(tags, vec![dinner, breakfast]);
        Ok(())
    }
}
