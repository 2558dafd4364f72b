//! Account repository for authentication data.
//!
//! Accounts live in `users`; the public-facing profile row is created by a
//! database trigger on insert and read through
//! [`crate::db::profiles::ProfileRepository`].

use sqlx::PgPool;

use recetario_core::{Email, UserId};

use super::{RepositoryError, conflict_on_unique};

/// An account row joined with its profile display name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
}

/// Account row plus its password hash, for credential verification.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountWithPassword {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub password_hash: String,
}

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account with email, password hash and display name.
    ///
    /// The profile row is created by the `users` insert trigger, seeded with
    /// the email's local part; the chosen display name is written over it in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        display_name: &str,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: UserId = sqlx::query_scalar(
            r"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "an account with this email already exists"))?;

        sqlx::query(
            r"
            UPDATE profiles
            SET display_name = $2
            WHERE user_id = $1
            ",
        )
        .bind(id)
        .bind(display_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Account {
            id,
            email: email.clone(),
            display_name: display_name.to_owned(),
        })
    }

    /// Get an account and password hash by email.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountWithPassword>(
            r"
            SELECT u.id, u.email, p.display_name, u.password_hash
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE lower(u.email) = lower($1)
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                Account {
                    id: r.id,
                    email: r.email,
                    display_name: r.display_name,
                },
                r.password_hash,
            )
        }))
    }

}
