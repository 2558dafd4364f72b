//! Profile repository.

use sqlx::PgPool;

use recetario_core::UserId;

use super::RepositoryError;
use crate::models::Profile;

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by its owning user id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, Profile>(
            r"
            SELECT user_id, display_name, avatar_url, bio, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Update the owning user's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no profile row exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        user_id: UserId,
        display_name: &str,
        bio: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET display_name = $2, bio = $3
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(bio)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the owning user's avatar URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no profile row exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_avatar(
        &self,
        user_id: UserId,
        avatar_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET avatar_url = $2
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(avatar_url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
