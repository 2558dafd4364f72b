//! Database operations for the recipe store.
//!
//! # Tables
//!
//! - `users` - Site authentication accounts
//! - `profiles` - Public profile, 1:1 with users (created by trigger)
//! - `recipes` + `recipe_ingredients` + `instructions` - Recipe aggregate
//! - `ingredients` - Global deduplicated ingredient catalog
//! - `categories` / `recipe_categories`, `tags` / `recipe_tags` - Taxonomies
//! - `bookmarks`, `likes` - Per-user per-recipe membership
//! - `recipe_notes` - Private-by-default notes, one per (user, recipe)
//! - `tower_sessions.session` - Session storage
//!
//! Recipe create/update goes through the `create_recipe_atomic` /
//! `update_recipe_atomic` database procedures so a recipe and its children
//! are written in one transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p recetario-cli -- migrate
//! ```

pub mod accounts;
pub mod bookmarks;
pub mod likes;
pub mod notes;
pub mod profiles;
pub mod recipes;
pub mod taxonomy;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use bookmarks::BookmarkRepository;
pub use likes::LikeRepository;
pub use notes::NoteRepository;
pub use profiles::ProfileRepository;
pub use recipes::{IngredientSpec, RecipeFilter, RecipeRepository, RecipeWrite};
pub use taxonomy::{CategoryCount, TaxonomyRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("{0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique violation.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}
