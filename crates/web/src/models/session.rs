//! What we keep in the session cookie store for a signed-in user.

use serde::{Deserialize, Serialize};

use recetario_core::{Email, UserId};

/// The identity payload stored in the session.
///
/// Deliberately small: anything richer (avatar, bio) is fetched per page so
/// profile edits show up without re-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    /// Profile display name, denormalized for the header chrome.
    pub display_name: String,
}

/// Well-known session keys.
pub mod keys {
    /// Where [`super::CurrentUser`] lives in the session.
    pub const CURRENT_USER: &str = "current_user";
}
