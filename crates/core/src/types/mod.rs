//! Core types for Recetario.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod difficulty;
pub mod email;
pub mod id;
pub mod slug;

pub use difficulty::Difficulty;
pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{Slug, SlugError};
