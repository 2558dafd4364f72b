//! Domain models for the recipe site.

pub mod profile;
pub mod recipe;
pub mod session;

pub use profile::Profile;
pub use recipe::{
    Category, Instruction, Recipe, RecipeIngredient, RecipeNote, RecipeSummary, Tag,
};
pub use session::{CurrentUser, keys as session_keys};
