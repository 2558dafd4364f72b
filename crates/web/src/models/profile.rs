//! User profile model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use recetario_core::UserId;

/// Public-facing extension of an account.
///
/// Created automatically when the account row is inserted (database
/// trigger); mutated only by the owning user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
