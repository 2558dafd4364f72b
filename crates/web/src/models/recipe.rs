//! Recipe domain models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use recetario_core::{
    CategoryId, Difficulty, IngredientId, NoteId, RecipeId, Slug, TagId, UserId,
};

/// A recipe row as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner_id: UserId,
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub prep_time_minutes: Option<i32>,
    pub cooking_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Difficulty,
    pub is_public: bool,
    /// URL the recipe was imported from, when applicable.
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact recipe row for listing pages.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub slug: Slug,
    pub image_url: Option<String>,
    pub difficulty: Difficulty,
    pub total_time_minutes: i32,
    pub author_name: String,
    pub like_count: i64,
}

/// One ingredient line of a recipe, in display order.
///
/// `order_index` is significant and preserved on read and write.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub note: Option<String>,
    pub order_index: i32,
}

/// One preparation step, numbered contiguously from 1.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Instruction {
    pub step_number: i32,
    pub content: String,
}

/// A global recipe category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

/// A free-form recipe tag.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A user's note on a recipe, private by default.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecipeNote {
    pub id: NoteId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
    pub body: String,
    pub is_private: bool,
    pub author_name: String,
    pub updated_at: DateTime<Utc>,
}
