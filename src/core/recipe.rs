//! Recipe business logic - creation, update, deletion, listing and validation.
//!
//! A recipe is written together with its tags and ingredient amounts inside a
//! single database transaction. Only the author may change or delete a recipe.
//! Deleting a recipe relies on the `ON DELETE CASCADE` foreign keys to remove
//! its tags, ingredient amounts, favorites and cart entries.

use crate::{
    core::{PageRequest, fetch_page, filter::RecipeFilter},
    entities::{
        Ingredient, Recipe, RecipeIngredient, RecipeTag, Tag, ingredient, recipe,
        recipe_ingredient, recipe_tag, tag,
    },
    errors::{Error, Result},
};
use sea_orm::{
    FromQueryResult, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// One ingredient line of a recipe payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    /// Ingredient id
    #[serde(rename = "id")]
    pub ingredient_id: i64,
    /// Quantity in the ingredient's unit
    pub amount: i32,
}

/// A complete recipe as submitted for creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    /// Preparation instructions
    pub text: String,
    /// Opaque image payload
    pub image: String,
    /// Minutes, at least 1
    pub cooking_time: i32,
    /// Tag ids
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A partial recipe: every absent field keeps its stored value.
///
/// This is also the wire shape of the create payload; missing fields there
/// turn into empty values and are reported by [`validate_recipe`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl From<RecipePatch> for RecipeDraft {
    fn from(patch: RecipePatch) -> Self {
        Self {
            name: patch.name.unwrap_or_default(),
            text: patch.text.unwrap_or_default(),
            image: patch.image.unwrap_or_default(),
            cooking_time: patch.cooking_time.unwrap_or_default(),
            tags: patch.tags.unwrap_or_default(),
            ingredients: patch.ingredients.unwrap_or_default(),
        }
    }
}

/// An ingredient as it appears inside a recipe.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct RecipeIngredientLine {
    /// Ingredient id
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    /// Quantity used by this recipe
    pub amount: i32,
}

/// Checks a recipe before it is persisted.
///
/// Fields are checked in a fixed order (name, cooking time, text, author,
/// image, tags, ingredients) and the first failure is returned, naming the
/// field. Amounts must be at least 1 and an ingredient may appear only once.
pub fn validate_recipe(draft: &RecipeDraft, author_id: Option<i64>) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(Error::validation("name", "Recipe name cannot be empty"));
    }
    if draft.name.chars().count() > 200 {
        return Err(Error::validation(
            "name",
            "Recipe name cannot be longer than 200 characters",
        ));
    }
    if draft.cooking_time < 1 {
        return Err(Error::validation(
            "cooking_time",
            "Cooking time must be at least 1 minute",
        ));
    }
    if draft.text.trim().is_empty() {
        return Err(Error::validation("text", "Recipe description cannot be empty"));
    }
    if author_id.is_none() {
        return Err(Error::validation("author", "Recipe author cannot be empty"));
    }
    if draft.image.trim().is_empty() {
        return Err(Error::validation("image", "Recipe image cannot be empty"));
    }
    if draft.tags.is_empty() {
        return Err(Error::validation("tags", "Recipe must have at least one tag"));
    }
    if draft.ingredients.is_empty() {
        return Err(Error::validation(
            "ingredients",
            "Recipe must have at least one ingredient",
        ));
    }

    let mut seen = HashSet::new();
    for line in &draft.ingredients {
        if line.amount < 1 {
            return Err(Error::validation(
                "ingredients",
                format!("Amount of ingredient {} must be at least 1", line.ingredient_id),
            ));
        }
        if !seen.insert(line.ingredient_id) {
            return Err(Error::validation(
                "ingredients",
                format!("Ingredient {} is listed more than once", line.ingredient_id),
            ));
        }
    }

    Ok(())
}

/// Verifies that every referenced tag and ingredient exists.
async fn check_references(db: &DatabaseConnection, draft: &RecipeDraft) -> Result<()> {
    let tag_ids: HashSet<i64> = draft.tags.iter().copied().collect();
    let found_tags = Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
        .count(db)
        .await?;
    if found_tags != u64::try_from(tag_ids.len())? {
        return Err(Error::validation("tags", "Unknown tag id"));
    }

    let ingredient_ids: HashSet<i64> = draft.ingredients.iter().map(|i| i.ingredient_id).collect();
    let found_ingredients = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids.iter().copied()))
        .count(db)
        .await?;
    if found_ingredients != u64::try_from(ingredient_ids.len())? {
        return Err(Error::validation("ingredients", "Unknown ingredient id"));
    }

    Ok(())
}

fn unique_tags(tags: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    tags.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn replace_tags<C>(db: &C, recipe_id: i64, tags: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    RecipeTag::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    RecipeTag::insert_many(unique_tags(tags).into_iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
        ..Default::default()
    }))
    .exec(db)
    .await?;
    Ok(())
}

async fn replace_ingredients<C>(db: &C, recipe_id: i64, lines: &[IngredientAmount]) -> Result<()>
where
    C: ConnectionTrait,
{
    RecipeIngredient::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    RecipeIngredient::insert_many(lines.iter().map(|line| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(line.ingredient_id),
        amount: Set(line.amount),
        ..Default::default()
    }))
    .exec(db)
    .await?;
    Ok(())
}

/// Creates a recipe with its tags and ingredients for `author_id`.
///
/// # Errors
/// Returns an error if validation fails, a referenced tag or ingredient does
/// not exist, or the database transaction fails.
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i64,
    draft: RecipeDraft,
) -> Result<recipe::Model> {
    validate_recipe(&draft, Some(author_id))?;
    check_references(db, &draft).await?;

    let txn = db.begin().await?;

    let created = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(draft.name.trim().to_string()),
        text: Set(draft.text),
        image: Set(draft.image),
        cooking_time: Set(draft.cooking_time),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_tags(&txn, created.id, &draft.tags).await?;
    replace_ingredients(&txn, created.id, &draft.ingredients).await?;

    txn.commit().await?;
    info!(recipe_id = created.id, author_id, "Created recipe '{}'", created.name);
    Ok(created)
}

/// Finds a recipe by id.
pub async fn get_recipe_by_id(db: &DatabaseConnection, recipe_id: i64) -> Result<Option<recipe::Model>> {
    Recipe::find_by_id(recipe_id).one(db).await.map_err(Into::into)
}

/// Finds a recipe by id or fails with [`Error::NotFound`].
pub async fn require_recipe(db: &DatabaseConnection, recipe_id: i64) -> Result<recipe::Model> {
    get_recipe_by_id(db, recipe_id).await?.ok_or(Error::NotFound {
        resource: "Recipe",
        id: recipe_id,
    })
}

/// Loads a recipe for modification by `editor_id`, who must be its author.
async fn require_own_recipe(
    db: &DatabaseConnection,
    recipe_id: i64,
    editor_id: i64,
) -> Result<recipe::Model> {
    let recipe = require_recipe(db, recipe_id).await?;
    if recipe.author_id != editor_id {
        return Err(Error::PermissionDenied);
    }
    Ok(recipe)
}

/// Applies `patch` to a recipe owned by `editor_id`.
///
/// Provided tag and ingredient lists replace the stored ones. The merged recipe
/// is validated exactly like a new one.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i64,
    editor_id: i64,
    patch: RecipePatch,
) -> Result<recipe::Model> {
    let current = require_own_recipe(db, recipe_id, editor_id).await?;

    let tags_changed = patch.tags.is_some();
    let ingredients_changed = patch.ingredients.is_some();
    let tags = match patch.tags {
        Some(tags) => tags,
        None => crate::core::tag::get_recipe_tags(db, recipe_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect(),
    };
    let ingredients = match patch.ingredients {
        Some(lines) => lines,
        None => get_recipe_ingredients(db, recipe_id)
            .await?
            .into_iter()
            .map(|line| IngredientAmount {
                ingredient_id: line.id,
                amount: line.amount,
            })
            .collect(),
    };
    let merged = RecipeDraft {
        name: patch.name.unwrap_or_else(|| current.name.clone()),
        text: patch.text.unwrap_or_else(|| current.text.clone()),
        image: patch.image.unwrap_or_else(|| current.image.clone()),
        cooking_time: patch.cooking_time.unwrap_or(current.cooking_time),
        tags,
        ingredients,
    };
    validate_recipe(&merged, Some(current.author_id))?;
    check_references(db, &merged).await?;

    let txn = db.begin().await?;

    let mut active: recipe::ActiveModel = current.into();
    active.name = Set(merged.name.trim().to_string());
    active.text = Set(merged.text);
    active.image = Set(merged.image);
    active.cooking_time = Set(merged.cooking_time);
    let updated = active.update(&txn).await?;

    if tags_changed {
        replace_tags(&txn, recipe_id, &merged.tags).await?;
    }
    if ingredients_changed {
        replace_ingredients(&txn, recipe_id, &merged.ingredients).await?;
    }

    txn.commit().await?;
    info!(recipe_id, "Updated recipe");
    Ok(updated)
}

/// Deletes a recipe owned by `editor_id`; dependent rows go with it.
pub async fn delete_recipe(db: &DatabaseConnection, recipe_id: i64, editor_id: i64) -> Result<()> {
    require_own_recipe(db, recipe_id, editor_id).await?;
    Recipe::delete_by_id(recipe_id).exec(db).await?;
    info!(recipe_id, "Deleted recipe");
    Ok(())
}

/// Lists recipes newest first, restricted by `filter` as seen by `viewer`.
pub async fn list_recipes(
    db: &DatabaseConnection,
    filter: &RecipeFilter,
    viewer: Option<i64>,
    page: PageRequest,
) -> Result<(Vec<recipe::Model>, u64)> {
    debug!(?filter, ?viewer, ?page, "Listing recipes");
    let query = filter
        .apply(Recipe::find(), viewer)
        .order_by_desc(recipe::Column::Id);
    fetch_page(db, query, page).await
}

/// Retrieves the ingredient lines of a recipe, ordered by ingredient name.
pub async fn get_recipe_ingredients<C>(db: &C, recipe_id: i64) -> Result<Vec<RecipeIngredientLine>>
where
    C: ConnectionTrait,
{
    RecipeIngredient::find()
        .select_only()
        .column_as(ingredient::Column::Id, "id")
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(recipe_ingredient::Column::Amount, "amount")
        .inner_join(Ingredient)
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .order_by_asc(ingredient::Column::Name)
        .into_model::<RecipeIngredientLine>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves up to `limit` recipes of an author, newest first.
pub async fn get_author_recipes<C>(db: &C, author_id: i64, limit: Option<u64>) -> Result<Vec<recipe::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Recipe::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.all(db).await.map_err(Into::into)
}

/// Counts all recipes of an author.
pub async fn count_author_recipes<C>(db: &C, author_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Recipe::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::toggle::{Association, RecipeList, ToggleAction, toggle},
        entities::{Favorite, ShoppingCart},
        test_utils::*,
    };

    fn draft(tags: Vec<i64>, ingredients: Vec<(i64, i32)>) -> RecipeDraft {
        RecipeDraft {
            name: "Omelette".to_string(),
            text: "Beat the eggs and fry.".to_string(),
            image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            cooking_time: 10,
            tags,
            ingredients: ingredients
                .into_iter()
                .map(|(ingredient_id, amount)| IngredientAmount {
                    ingredient_id,
                    amount,
                })
                .collect(),
        }
    }

    fn invalid_field(result: Result<()>) -> String {
        match result {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_order() {
        let valid = draft(vec![1], vec![(1, 2)]);
        assert!(validate_recipe(&valid, Some(1)).is_ok());

        let empty = RecipeDraft::default();
        assert_eq!(invalid_field(validate_recipe(&empty, None)), "name");

        let mut no_time = valid.clone();
        no_time.cooking_time = 0;
        no_time.text = String::new();
        assert_eq!(invalid_field(validate_recipe(&no_time, Some(1))), "cooking_time");

        let mut no_text = valid.clone();
        no_text.text = "   ".to_string();
        assert_eq!(invalid_field(validate_recipe(&no_text, None)), "text");

        assert_eq!(invalid_field(validate_recipe(&valid, None)), "author");

        let mut no_image = valid.clone();
        no_image.image = String::new();
        no_image.tags.clear();
        assert_eq!(invalid_field(validate_recipe(&no_image, Some(1))), "image");

        let no_tags = draft(vec![], vec![]);
        assert_eq!(invalid_field(validate_recipe(&no_tags, Some(1))), "tags");

        let no_ingredients = draft(vec![1], vec![]);
        assert_eq!(invalid_field(validate_recipe(&no_ingredients, Some(1))), "ingredients");
    }

    #[test]
    fn test_validation_of_amounts() {
        let zero = draft(vec![1], vec![(1, 0)]);
        assert_eq!(invalid_field(validate_recipe(&zero, Some(1))), "ingredients");

        let duplicate = draft(vec![1], vec![(1, 2), (1, 3)]);
        assert_eq!(invalid_field(validate_recipe(&duplicate, Some(1))), "ingredients");
    }

    #[test]
    fn test_patch_into_draft_defaults() {
        let draft: RecipeDraft = RecipePatch {
            name: Some("Tea".to_string()),
            ..Default::default()
        }
        .into();
        assert_eq!(draft.name, "Tea");
        assert_eq!(draft.cooking_time, 0);
        assert!(draft.tags.is_empty());
    }

    #[tokio::test]
    async fn test_create_recipe_persists_tags_and_ingredients() -> Result<()> {
        let db = setup_test_db().await?;
        let author = create_test_user(&db, "chef").await?;
        let breakfast = create_test_tag(&db, "breakfast").await?;
        let eggs = create_test_ingredient(&db, "Eggs", "pcs").await?;
        let butter = create_test_ingredient(&db, "Butter", "g").await?;

        let recipe = create_recipe(
            &db,
            author.id,
            draft(vec![breakfast.id, breakfast.id], vec![(eggs.id, 3), (butter.id, 20)]),
        )
        .await?;
        assert_eq!(recipe.author_id, author.id);
        assert_eq!(recipe.name, "Omelette");

        let tags = crate::core::tag::get_recipe_tags(&db, recipe.id).await?;
        assert_eq!(tags, vec![breakfast]);

        let lines = get_recipe_ingredients(&db, recipe.id).await?;
        assert_eq!(
            lines,
            vec![
                RecipeIngredientLine {
                    id: butter.id,
                    name: "Butter".to_string(),
                    measurement_unit: "g".to_string(),
                    amount: 20,
                },
                RecipeIngredientLine {
                    id: eggs.id,
                    name: "Eggs".to_string(),
                    measurement_unit: "pcs".to_string(),
                    amount: 3,
                },
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_recipe_rejects_unknown_references() -> Result<()> {
        let db = setup_test_db().await?;
        let author = create_test_user(&db, "chef").await?;
        let tag = create_test_tag(&db, "breakfast").await?;
        let eggs = create_test_ingredient(&db, "Eggs", "pcs").await?;

        let unknown_tag = create_recipe(&db, author.id, draft(vec![tag.id, 77], vec![(eggs.id, 1)])).await;
        assert_eq!(invalid_field(unknown_tag.map(|_| ())), "tags");

        let unknown_ingredient = create_recipe(&db, author.id, draft(vec![tag.id], vec![(77, 1)])).await;
        assert_eq!(invalid_field(unknown_ingredient.map(|_| ())), "ingredients");

        // nothing was written
        assert_eq!(Recipe::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_recipe_replaces_provided_sets_only() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let old_tags = crate::core::tag::get_recipe_tags(&db, recipe.id).await?;
        let pepper = create_test_ingredient(&db, "Pepper", "g").await?;

        let updated = update_recipe(
            &db,
            recipe.id,
            author.id,
            RecipePatch {
                name: Some("Spicy".to_string()),
                ingredients: Some(vec![IngredientAmount {
                    ingredient_id: pepper.id,
                    amount: 4,
                }]),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Spicy");
        assert_eq!(updated.text, recipe.text);

        let lines = get_recipe_ingredients(&db, recipe.id).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Pepper");
        assert_eq!(lines[0].amount, 4);
        assert_eq!(crate::core::tag::get_recipe_tags(&db, recipe.id).await?, old_tags);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_recipe_rejects_empty_tags() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let result = update_recipe(
            &db,
            recipe.id,
            author.id,
            RecipePatch {
                tags: Some(vec![]),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(invalid_field(result.map(|_| ())), "tags");
        Ok(())
    }

    #[tokio::test]
    async fn test_only_author_can_modify() -> Result<()> {
        let (db, _author, recipe) = setup_with_recipe().await?;
        let stranger = create_test_user(&db, "stranger").await?;

        let update = update_recipe(&db, recipe.id, stranger.id, RecipePatch::default()).await;
        assert!(matches!(update, Err(Error::PermissionDenied)));
        let delete = delete_recipe(&db, recipe.id, stranger.id).await;
        assert!(matches!(delete, Err(Error::PermissionDenied)));
        let missing = delete_recipe(&db, 4242, stranger.id).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let fan = create_test_user(&db, "fan").await?;
        toggle(&db, Association::Recipes(RecipeList::Favorites), recipe.id, fan.id, ToggleAction::Add).await?;
        toggle(&db, Association::Recipes(RecipeList::ShoppingCart), recipe.id, fan.id, ToggleAction::Add).await?;

        delete_recipe(&db, recipe.id, author.id).await?;

        assert!(get_recipe_by_id(&db, recipe.id).await?.is_none());
        assert_eq!(RecipeIngredient::find().count(&db).await?, 0);
        assert_eq!(RecipeTag::find().count(&db).await?, 0);
        assert_eq!(Favorite::find().count(&db).await?, 0);
        assert_eq!(ShoppingCart::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_author_recipes_limit_and_count() -> Result<()> {
        let db = setup_test_db().await?;
        let author = create_test_user(&db, "chef").await?;
        let tag = create_test_tag(&db, "dinner").await?;
        let salt = create_test_ingredient(&db, "Salt", "g").await?;
        let mut created = Vec::new();
        for name in ["One", "Two", "Three"] {
            created.push(create_test_recipe(&db, author.id, name, &[tag.id], &[(salt.id, 1)]).await?);
        }

        let limited = get_author_recipes(&db, author.id, Some(2)).await?;
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, created[2].id);
        assert_eq!(limited[1].id, created[1].id);
        assert_eq!(get_author_recipes(&db, author.id, None).await?.len(), 3);
        assert_eq!(count_author_recipes(&db, author.id).await?, 3);

        Ok(())
    }
}
