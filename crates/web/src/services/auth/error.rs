//! Failures from registration and login.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The email failed structural validation.
    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] recetario_core::EmailError),

    /// Wrong password, or no account for that email. Deliberately one
    /// variant so login can't be used to probe which emails exist.
    #[error("email or password is incorrect")]
    InvalidCredentials,

    /// Registration against an email that already has an account.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// The password failed a policy check; the string says which one.
    #[error("unusable password: {0}")]
    WeakPassword(String),

    /// The display name is missing or unusable.
    #[error("unusable display name: {0}")]
    InvalidDisplayName(String),

    /// The database said no.
    #[error("storage failure: {0}")]
    Repository(#[from] RepositoryError),

    /// Argon2 could not hash or verify.
    #[error("password hashing failed")]
    PasswordHash,
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_)
            | Self::WeakPassword(_)
            | Self::InvalidDisplayName(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::Repository(_) | Self::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the form shows. Infrastructure failures collapse to a generic
    /// line; the real cause goes to the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_owned()
            }
            other => other.to_string(),
        }
    }
}
