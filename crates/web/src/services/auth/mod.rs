//! Session-based authentication.
//!
//! Passwords are hashed with Argon2id and verified against the stored
//! encoded hash. A registered or logged-in user is written to the session
//! as a [`CurrentUser`]; the session cookie carries nothing else.

pub mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use recetario_core::Email;

use crate::db::{AccountRepository, RepositoryError};
use crate::models::{CurrentUser, session_keys};

/// Minimum password length for registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum display name length for registration.
const MAX_DISPLAY_NAME_LENGTH: usize = 80;

/// Authentication service over the accounts table.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an account without logging it in. Used by registration and
    /// by the seeding CLI.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidDisplayName` on bad input,
    /// `AuthError::UserAlreadyExists` when the email is taken.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let display_name = validate_display_name(display_name)?;

        let hash = hash_password(password)?;
        let account = AccountRepository::new(self.pool)
            .create(&email, &hash, display_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %account.id, "account registered");

        Ok(CurrentUser {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
        })
    }

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_account`].
    pub async fn register(
        &self,
        session: &Session,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<CurrentUser, AuthError> {
        let user = self.create_account(email, password, display_name).await?;
        store_session_user(session, &user).await?;
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password; the two are not distinguished.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((account, hash)) = AccountRepository::new(self.pool)
            .get_with_password(&email)
            .await?
        else {
            warn!("login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &hash)?;

        info!(user_id = %account.id, "login succeeded");

        let user = CurrentUser {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
        };
        store_session_user(session, &user).await?;
        Ok(user)
    }

    /// Log out: drop the whole session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the session store fails.
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        session
            .flush()
            .await
            .map_err(|e| AuthError::Repository(RepositoryError::DataCorruption(e.to_string())))?;
        Ok(())
    }
}

async fn store_session_user(session: &Session, user: &CurrentUser) -> Result<(), AuthError> {
    // Rotate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AuthError::Repository(RepositoryError::DataCorruption(e.to_string())))?;
    session
        .insert(session_keys::CURRENT_USER, user)
        .await
        .map_err(|e| AuthError::Repository(RepositoryError::DataCorruption(e.to_string())))?;
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn validate_display_name(name: &str) -> Result<&str, AuthError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidDisplayName(
            "display name must not be empty".to_owned(),
        ));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(AuthError::InvalidDisplayName(format!(
            "display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed)
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length_floor() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_display_name_rules() {
        assert_eq!(validate_display_name("  Ana  ").unwrap(), "Ana");
        assert!(matches!(
            validate_display_name("   "),
            Err(AuthError::InvalidDisplayName(_))
        ));
        let long = "x".repeat(MAX_DISPLAY_NAME_LENGTH + 1);
        assert!(matches!(
            validate_display_name(&long),
            Err(AuthError::InvalidDisplayName(_))
        ));
    }
}
