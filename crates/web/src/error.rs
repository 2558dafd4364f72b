//! Unified error handling with Sentry integration.
//!
//! Two layers live here:
//!
//! - [`ErrorCode`] - the symbolic failure taxonomy every user-facing error is
//!   resolved through, with a fixed code-to-message lookup and cleanup of
//!   known error prefixes before display.
//! - [`AppError`] - the page-fatal error type for route handlers that cannot
//!   degrade. Data-fetch failures never reach it; they are absorbed by the
//!   aggregator in [`crate::fetch`] with per-action fallbacks.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::storage::StorageError;

// =============================================================================
// Error Taxonomy
// =============================================================================

/// Symbolic failure codes for user-facing errors.
///
/// Every failure shown to a user resolves to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    Unauthorized,
    Forbidden,
    Validation,
    Network,
    Server,
    Unknown,
}

impl ErrorCode {
    /// Stable symbolic name, used in logs and tests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }

    /// Fixed code-to-message lookup for user display.
    ///
    /// Returns `None` for codes whose raw message should be shown instead
    /// (validation errors carry field-specific text).
    #[must_use]
    pub const fn default_message(self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some("That item could not be found"),
            Self::Unauthorized => Some("Please sign in to continue"),
            Self::Forbidden => Some("You do not have permission to do that"),
            Self::Network => Some("Connection problem, please try again"),
            Self::Server => Some("Something went wrong on our side"),
            Self::Unknown => Some("An unexpected error occurred"),
            Self::Validation => None,
        }
    }

    /// The HTTP status conventionally paired with this code.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Network => StatusCode::BAD_GATEWAY,
            Self::Server | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known library prefixes stripped from raw messages before display.
const NOISE_PREFIXES: &[&str] = &[
    "error returned from database: ",
    "database error: ",
    "auth error: ",
    "storage error: ",
    "io error: ",
    "error with configuration: ",
];

/// Strip known library prefixes from a raw error message.
///
/// Unmapped messages pass through unchanged; only the outermost matching
/// prefix is removed.
#[must_use]
pub fn clean_message(raw: &str) -> &str {
    for prefix in NOISE_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return rest;
        }
    }
    raw
}

/// User-facing message for a duplicate recipe slug.
///
/// Duplicate-key violations on recipe save are recognized specifically and
/// translated rather than surfaced as a generic database error.
pub const DUPLICATE_RECIPE_MESSAGE: &str = "You already have a recipe with that name";

// =============================================================================
// Application Error
// =============================================================================

/// Application-level error type for page-fatal failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Media storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => err.status(),
            Self::Storage(err) => err.status(),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => {
                "Not found".to_string()
            }
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => err.user_message(),
            Self::Storage(err) => err.to_string(),
            Self::Unauthorized(_) => "Please sign in to continue".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message_strips_known_prefixes() {
        assert_eq!(
            clean_message("error returned from database: duplicate key"),
            "duplicate key"
        );
        assert_eq!(clean_message("auth error: invalid credentials"), "invalid credentials");
        assert_eq!(clean_message("plain message"), "plain message");
    }

    #[test]
    fn test_clean_message_only_strips_outermost() {
        assert_eq!(
            clean_message("database error: io error: reset"),
            "io error: reset"
        );
    }

    #[test]
    fn test_code_default_messages() {
        assert!(ErrorCode::Server.default_message().is_some());
        // Validation messages are field-specific, no lookup entry
        assert!(ErrorCode::Validation.default_message().is_none());
    }

    #[test]
    fn test_code_status_pairing() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::Unknown.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("recipe 123".to_string());
        assert_eq!(err.to_string(), "Not found: recipe 123");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
