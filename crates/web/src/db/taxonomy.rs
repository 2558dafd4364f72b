//! Category and tag lookups.
//!
//! Categories are a fixed, seeded vocabulary; tags are free-form and created
//! lazily by `upsert_tag`. Both are read far more than written, so the
//! repository stays small.

use sqlx::PgPool;

use recetario_core::{Slug, TagId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Category;

/// Category plus the number of public recipes linked to it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCount {
    #[sqlx(flatten)]
    pub category: Category,
    pub recipe_count: i64,
}

pub struct TaxonomyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxonomyRepository<'a> {
    /// Create a new taxonomy repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Categories with public-recipe counts, for the browse sidebar.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories_with_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT c.id, c.name, c.slug,
                   COUNT(r.id) FILTER (WHERE r.is_public) AS recipe_count
            FROM categories c
            LEFT JOIN recipe_categories rc ON rc.category_id = c.id
            LEFT JOIN recipes r ON r.id = rc.recipe_id
            GROUP BY c.id, c.name, c.slug
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug
            FROM categories
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Get or create a tag by name. Names are matched case-insensitively
    /// and stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the name is empty after
    /// trimming. Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_tag(&self, name: &str) -> Result<TagId, RepositoryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RepositoryError::DataCorruption(
                "tag name must not be empty".to_owned(),
            ));
        }

        let id: TagId = sqlx::query_scalar(
            r"
            INSERT INTO tags (name)
            VALUES ($1)
            ON CONFLICT (lower(name)) DO UPDATE SET name = tags.name
            RETURNING id
            ",
        )
        .bind(trimmed)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a tag with this name already exists"))?;

        Ok(id)
    }

    /// Replace the tag set on a recipe. Callers pass tag ids already
    /// resolved through `upsert_tag`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn set_recipe_tags(
        &self,
        recipe_id: recetario_core::RecipeId,
        tag_ids: &[TagId],
    ) -> Result<(), RepositoryError> {
        let ids: Vec<i64> = tag_ids.iter().map(|t| t.as_i64()).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            INSERT INTO recipe_tags (recipe_id, tag_id)
            SELECT $1, unnest($2::bigint[])
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(recipe_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
