//! Recipe likes.
//!
//! A like is a bare `(user_id, recipe_id)` row; the composite primary key
//! makes the pair unique with no surrogate id. Toggling is two statements
//! rather than read-then-write so concurrent toggles cannot double-insert.

use sqlx::PgPool;

use recetario_core::{RecipeId, UserId};

use super::RepositoryError;

pub struct LikeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LikeRepository<'a> {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a like and return the new state: `true` means liked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn toggle(&self, user: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            r"
            INSERT INTO likes (user_id, recipe_id)
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
            DELETE FROM likes
            WHERE user_id = $1 AND recipe_id = $2
            ",
        )
        .bind(user)
        .bind(recipe)
        .execute(self.pool)
        .await?;

        Ok(false)
    }

    /// Number of likes on a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, recipe: RecipeId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM likes WHERE recipe_id = $1
            ",
        )
        .bind(recipe)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Whether `user` has liked `recipe`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn state(&self, user: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let liked: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM likes WHERE user_id = $1 AND recipe_id = $2
            )
            ",
        )
        .bind(user)
        .bind(recipe)
        .fetch_one(self.pool)
        .await?;
        Ok(liked)
    }
}
