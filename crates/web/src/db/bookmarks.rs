//! Recipe bookmarks.
//!
//! Bookmarks carry a surrogate id alongside a unique `(user_id, recipe_id)`
//! constraint, so they can be referenced individually while the pair stays
//! unique. The toggle shape mirrors likes: insert-or-nothing, then delete.

use sqlx::PgPool;

use recetario_core::{RecipeId, UserId};

use super::RepositoryError;
use crate::models::RecipeSummary;

pub struct BookmarkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookmarkRepository<'a> {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a bookmark and return the new state: `true` means bookmarked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn toggle(&self, user: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            r"
            INSERT INTO bookmarks (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(recipe)
        .execute(self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            return Ok(true);
        }

        sqlx::query(
            r"
            DELETE FROM bookmarks
            WHERE user_id = $1 AND recipe_id = $2
            ",
        )
        .bind(user)
        .bind(recipe)
        .execute(self.pool)
        .await?;

        Ok(false)
    }

    /// Whether `user` has bookmarked `recipe`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn state(&self, user: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let bookmarked: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM bookmarks WHERE user_id = $1 AND recipe_id = $2
            )
            ",
        )
        .bind(user)
        .bind(recipe)
        .fetch_one(self.pool)
        .await?;
        Ok(bookmarked)
    }

    /// Recipes the user has bookmarked, newest bookmark first. Private
    /// recipes stay visible here only to their owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RecipeSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeSummary>(
            r"
            SELECT r.id, r.title, r.slug, r.image_url, r.difficulty,
                   COALESCE(r.prep_time_minutes, 0) + COALESCE(r.cooking_time_minutes, 0)
                       AS total_time_minutes,
                   p.display_name AS author_name,
                   (SELECT COUNT(*) FROM likes l WHERE l.recipe_id = r.id) AS like_count
            FROM bookmarks b
            JOIN recipes r ON r.id = b.recipe_id
            JOIN profiles p ON p.user_id = r.owner_id
            WHERE b.user_id = $1
              AND (r.is_public OR r.owner_id = $1)
            ORDER BY b.created_at DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
