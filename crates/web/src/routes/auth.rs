//! Authentication route handlers.
//!
//! Login, registration and logout against the local accounts table. A
//! `next` query parameter carries the page that triggered the login
//! redirect; it is validated to a local path before use.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::safe_next_path;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for the login/register pages.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<AuthQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        next: safe_next_path(query.next.as_deref()).to_owned(),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next_path(form.next.as_deref());

    match AuthService::new(state.pool())
        .login(&session, &form.email, &form.password)
        .await
    {
        Ok(_) => Redirect::to(next).into_response(),
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let target = format!(
                "/auth/login?error=credentials&next={}",
                urlencoding::encode(next)
            );
            Redirect::to(&target).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<AuthQuery>) -> impl IntoResponse {
    RegisterTemplate { error: query.error }
}

/// Handle registration form submission. A successful registration logs the
/// new account in directly.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=password_mismatch").into_response();
    }

    match AuthService::new(state.pool())
        .register(&session, &form.email, &form.password, &form.display_name)
        .await
    {
        Ok(_) => Redirect::to("/account").into_response(),
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            let code = match e {
                AuthError::UserAlreadyExists => "email_taken",
                AuthError::WeakPassword(_) => "password_too_short",
                AuthError::InvalidEmail(_) => "invalid_email",
                AuthError::InvalidDisplayName(_) => "invalid_display_name",
                _ => "failed",
            };
            Redirect::to(&format!("/auth/register?error={code}")).into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout: destroy the whole session.
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Err(e) = AuthService::new(state.pool()).logout(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    Redirect::to("/").into_response()
}
