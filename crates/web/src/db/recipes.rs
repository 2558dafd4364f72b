//! Recipe repository.
//!
//! Reads are plain queries; recipe create/update goes through the
//! `create_recipe_atomic` / `update_recipe_atomic` database procedures,
//! which upsert ingredients by normalized name and replace the full set of
//! ingredient links, instructions and category links in one transaction.
//! Partial application on error is not possible, so there is no caller-side
//! compensation logic here.

use sqlx::PgPool;

use recetario_core::{CategoryId, Difficulty, RecipeId, Slug, TagId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::error::DUPLICATE_RECIPE_MESSAGE;
use crate::models::{Category, Instruction, Recipe, RecipeIngredient, RecipeSummary, Tag};

/// Postgres error code raised by `update_recipe_atomic` when the caller
/// does not own the recipe (`no_data_found`).
const NOT_OWNED_SQLSTATE: &str = "P0002";

/// One ingredient line as submitted, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientSpec {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub note: Option<String>,
}

/// Full payload for an atomic recipe write.
#[derive(Debug, Clone)]
pub struct RecipeWrite {
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub prep_time_minutes: Option<i32>,
    pub cooking_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Difficulty,
    pub is_public: bool,
    pub source_url: Option<String>,
    /// Ingredient lines; array position becomes `order_index`.
    pub ingredients: Vec<IngredientSpec>,
    /// Step contents; array position becomes `step_number` (1-based).
    pub instructions: Vec<String>,
    pub category_ids: Vec<CategoryId>,
}

impl RecipeWrite {
    /// Split ingredient specs into the parallel arrays the procedures take.
    #[allow(clippy::type_complexity)]
    fn ingredient_arrays(
        &self,
    ) -> (
        Vec<String>,
        Vec<Option<String>>,
        Vec<Option<String>>,
        Vec<Option<String>>,
    ) {
        let mut names = Vec::with_capacity(self.ingredients.len());
        let mut quantities = Vec::with_capacity(self.ingredients.len());
        let mut units = Vec::with_capacity(self.ingredients.len());
        let mut notes = Vec::with_capacity(self.ingredients.len());
        for spec in &self.ingredients {
            names.push(spec.name.clone());
            quantities.push(spec.quantity.clone());
            units.push(spec.unit.clone());
            notes.push(spec.note.clone());
        }
        (names, quantities, units, notes)
    }
}

/// Listing filters for the browse/search page.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Full-text query (websearch syntax), delegated to Postgres.
    pub query: Option<String>,
    pub category: Option<CategoryId>,
    pub tag: Option<TagId>,
    /// 1-based page number.
    pub page: u32,
}

impl RecipeFilter {
    /// Recipes per listing page.
    pub const PAGE_SIZE: u32 = 24;

    fn limit(&self) -> i64 {
        i64::from(Self::PAGE_SIZE)
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(Self::PAGE_SIZE)
    }
}

/// Recipe row plus author display name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RecipeWithAuthor {
    #[sqlx(flatten)]
    recipe: Recipe,
    author_name: String,
}

const SUMMARY_SELECT: &str = r"
    SELECT r.id, r.title, r.slug, r.image_url, r.difficulty,
           COALESCE(r.prep_time_minutes, 0) + COALESCE(r.cooking_time_minutes, 0)
               AS total_time_minutes,
           p.display_name AS author_name,
           (SELECT COUNT(*) FROM likes l WHERE l.recipe_id = r.id) AS like_count
    FROM recipes r
    JOIN profiles p ON p.user_id = r.owner_id
";

/// Repository for recipe database operations.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// List public recipes matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeSummary>, RepositoryError> {
        let sql = format!(
            r"{SUMMARY_SELECT}
            WHERE r.is_public
              AND ($1::text IS NULL OR r.search_tsv @@ websearch_to_tsquery('simple', $1))
              AND ($2::bigint IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_categories rc
                    WHERE rc.recipe_id = r.id AND rc.category_id = $2))
              AND ($3::bigint IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    WHERE rt.recipe_id = r.id AND rt.tag_id = $3))
            ORDER BY r.created_at DESC
            LIMIT $4 OFFSET $5
            "
        );

        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(filter.query.as_deref())
            .bind(filter.category)
            .bind(filter.tag)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Most recently published public recipes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: i64) -> Result<Vec<RecipeSummary>, RepositoryError> {
        let sql = format!(
            r"{SUMMARY_SELECT}
            WHERE r.is_public
            ORDER BY r.created_at DESC
            LIMIT $1
            "
        );
        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Most liked public recipes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular(&self, limit: i64) -> Result<Vec<RecipeSummary>, RepositoryError> {
        let sql = format!(
            r"{SUMMARY_SELECT}
            WHERE r.is_public
            ORDER BY like_count DESC, r.created_at DESC
            LIMIT $1
            "
        );
        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// All recipes owned by `owner`, including private ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_owner(&self, owner: UserId) -> Result<Vec<RecipeSummary>, RepositoryError> {
        let sql = format!(
            r"{SUMMARY_SELECT}
            WHERE r.owner_id = $1
            ORDER BY r.created_at DESC
            "
        );
        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(owner)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a recipe visible to `viewer`: public, or owned by the viewer.
    ///
    /// Returns the recipe and its author's display name. `None` covers both
    /// "does not exist" and "not visible" - the two are indistinguishable to
    /// a non-owner by design.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_visible(
        &self,
        id: RecipeId,
        viewer: Option<UserId>,
    ) -> Result<Option<(Recipe, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeWithAuthor>(
            r"
            SELECT r.id, r.owner_id, r.title, r.slug, r.description, r.image_url,
                   r.prep_time_minutes, r.cooking_time_minutes, r.servings,
                   r.difficulty, r.is_public, r.source_url, r.created_at, r.updated_at,
                   p.display_name AS author_name
            FROM recipes r
            JOIN profiles p ON p.user_id = r.owner_id
            WHERE r.id = $1 AND (r.is_public OR r.owner_id = $2)
            ",
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.recipe, r.author_name)))
    }

    /// Ingredient lines for a recipe, in stored order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ingredients(
        &self,
        id: RecipeId,
    ) -> Result<Vec<RecipeIngredient>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeIngredient>(
            r"
            SELECT ri.ingredient_id, i.name, ri.quantity, ri.unit, ri.note, ri.order_index
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = $1
            ORDER BY ri.order_index
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Instruction steps for a recipe, in step order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn instructions(&self, id: RecipeId) -> Result<Vec<Instruction>, RepositoryError> {
        let rows = sqlx::query_as::<_, Instruction>(
            r"
            SELECT step_number, content
            FROM instructions
            WHERE recipe_id = $1
            ORDER BY step_number
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Categories linked to a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self, id: RecipeId) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            r"
            SELECT c.id, c.name, c.slug
            FROM recipe_categories rc
            JOIN categories c ON c.id = rc.category_id
            WHERE rc.recipe_id = $1
            ORDER BY c.name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Tags linked to a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags(&self, id: RecipeId) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query_as::<_, Tag>(
            r"
            SELECT t.id, t.name
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = $1
            ORDER BY t.name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    // Atomic writes
    // =========================================================================

    /// Create a recipe and all of its children in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a recipe
    /// with the same slug. Returns `RepositoryError::Database` for other
    /// database errors.
    pub async fn create_atomic(
        &self,
        owner: UserId,
        write: &RecipeWrite,
    ) -> Result<RecipeId, RepositoryError> {
        let (names, quantities, units, notes) = write.ingredient_arrays();
        let category_ids: Vec<i64> = write.category_ids.iter().map(|c| c.as_i64()).collect();

        let id: i64 = sqlx::query_scalar(
            r"
            SELECT create_recipe_atomic(
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17
            )
            ",
        )
        .bind(owner)
        .bind(&write.title)
        .bind(&write.slug)
        .bind(write.description.as_deref())
        .bind(write.image_url.as_deref())
        .bind(write.prep_time_minutes)
        .bind(write.cooking_time_minutes)
        .bind(write.servings)
        .bind(write.difficulty)
        .bind(write.is_public)
        .bind(write.source_url.as_deref())
        .bind(&names)
        .bind(&quantities)
        .bind(&units)
        .bind(&notes)
        .bind(&write.instructions)
        .bind(&category_ids)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_RECIPE_MESSAGE))?;

        Ok(RecipeId::new(id))
    }

    /// Update a recipe and replace all of its children in one transaction.
    ///
    /// The procedure verifies ownership first and fails the whole
    /// transaction when `owner` does not own the recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist or
    /// is not owned by `owner`. Returns `RepositoryError::Conflict` on a
    /// duplicate slug. Returns `RepositoryError::Database` otherwise.
    pub async fn update_atomic(
        &self,
        id: RecipeId,
        owner: UserId,
        write: &RecipeWrite,
    ) -> Result<(), RepositoryError> {
        let (names, quantities, units, notes) = write.ingredient_arrays();
        let category_ids: Vec<i64> = write.category_ids.iter().map(|c| c.as_i64()).collect();

        sqlx::query(
            r"
            SELECT update_recipe_atomic(
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18
            )
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(&write.title)
        .bind(&write.slug)
        .bind(write.description.as_deref())
        .bind(write.image_url.as_deref())
        .bind(write.prep_time_minutes)
        .bind(write.cooking_time_minutes)
        .bind(write.servings)
        .bind(write.difficulty)
        .bind(write.is_public)
        .bind(write.source_url.as_deref())
        .bind(&names)
        .bind(&quantities)
        .bind(&units)
        .bind(&notes)
        .bind(&write.instructions)
        .bind(&category_ids)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some(NOT_OWNED_SQLSTATE) {
                    return RepositoryError::NotFound;
                }
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict(DUPLICATE_RECIPE_MESSAGE.to_owned());
                }
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Replace a recipe's image URL, owner-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist or
    /// is not owned by `owner`.
    pub async fn set_image(
        &self,
        id: RecipeId,
        owner: UserId,
        image_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE recipes
            SET image_url = $3
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(image_url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a recipe, owner-scoped. Children cascade in the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist or
    /// is not owned by `owner`.
    pub async fn delete(&self, id: RecipeId, owner: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM recipes
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_offset() {
        let filter = RecipeFilter {
            page: 1,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 0);

        let filter = RecipeFilter {
            page: 3,
            ..Default::default()
        };
        assert_eq!(filter.offset(), i64::from(RecipeFilter::PAGE_SIZE) * 2);

        // Page 0 is treated as page 1 rather than underflowing.
        let filter = RecipeFilter::default();
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_ingredient_arrays_preserve_order() {
        let write = RecipeWrite {
            title: "Pan".into(),
            slug: Slug::parse("pan").expect("valid slug"),
            description: None,
            image_url: None,
            prep_time_minutes: None,
            cooking_time_minutes: None,
            servings: None,
            difficulty: Difficulty::Easy,
            is_public: true,
            source_url: None,
            ingredients: vec![
                IngredientSpec {
                    name: "Harina".into(),
                    quantity: Some("2".into()),
                    unit: Some("taza".into()),
                    note: None,
                },
                IngredientSpec {
                    name: "Sal".into(),
                    quantity: Some("1".into()),
                    unit: Some("pizca".into()),
                    note: None,
                },
            ],
            instructions: vec!["Mezclar".into(), "Hornear".into()],
            category_ids: vec![],
        };

        let (names, quantities, units, _) = write.ingredient_arrays();
        assert_eq!(names, vec!["Harina", "Sal"]);
        assert_eq!(quantities, vec![Some("2".to_string()), Some("1".to_string())]);
        assert_eq!(units, vec![Some("taza".to_string()), Some("pizca".to_string())]);
    }
}
