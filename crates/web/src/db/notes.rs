//! Personal recipe notes.
//!
//! Each user keeps at most one note per recipe, enforced by a unique
//! `(user_id, recipe_id)` constraint and written through an upsert. Notes
//! are private by default; a private note is returned only to its author,
//! regardless of who owns the recipe.

use sqlx::PgPool;

use recetario_core::{NoteId, RecipeId, UserId};

use super::RepositoryError;
use crate::models::RecipeNote;

pub struct NoteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NoteRepository<'a> {
    /// Create a new note repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Notes on a recipe visible to `viewer`: all shared notes, plus the
    /// viewer's own note whether shared or not. Anonymous viewers see only
    /// shared notes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn visible_for_recipe(
        &self,
        recipe: RecipeId,
        viewer: Option<UserId>,
    ) -> Result<Vec<RecipeNote>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeNote>(
            r"
            SELECT n.id, n.user_id, n.recipe_id, n.body, n.is_private,
                   p.display_name AS author_name, n.updated_at
            FROM recipe_notes n
            JOIN profiles p ON p.user_id = n.user_id
            WHERE n.recipe_id = $1
              AND (NOT n.is_private OR n.user_id = $2)
            ORDER BY n.updated_at DESC
            ",
        )
        .bind(recipe)
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Create or replace the user's note on a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the body is empty after
    /// trimming. Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user: UserId,
        recipe: RecipeId,
        body: &str,
        is_private: bool,
    ) -> Result<NoteId, RepositoryError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(RepositoryError::DataCorruption(
                "note body must not be empty".to_owned(),
            ));
        }

        let id: NoteId = sqlx::query_scalar(
            r"
            INSERT INTO recipe_notes (user_id, recipe_id, body, is_private)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, recipe_id)
            DO UPDATE SET body = EXCLUDED.body,
                          is_private = EXCLUDED.is_private,
                          updated_at = now()
            RETURNING id
            ",
        )
        .bind(user)
        .bind(recipe)
        .bind(trimmed)
        .bind(is_private)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Delete the user's note on a recipe. Returns `true` if a note was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM recipe_notes
            WHERE user_id = $1 AND recipe_id = $2
            ",
        )
        .bind(user)
        .bind(recipe)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
