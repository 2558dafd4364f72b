//! Integration tests for Recetario.
//!
//! These tests drive a running server over HTTP with a cookie-holding
//! client, so they exercise the full stack: routing, sessions, forms,
//! the database and the rendered HTML.
//!
//! # Running
//!
//! ```bash
//! # Migrate and start the server first
//! cargo run -p recetario-cli -- migrate
//! cargo run -p recetario-web &
//!
//! # Then run the ignored tests
//! cargo test -p recetario-integration-tests -- --ignored
//! ```
//!
//! The server address defaults to `http://localhost:3000` and can be
//! overridden with `RECETARIO_BASE_URL`.

use reqwest::Client;
use reqwest::redirect::Policy;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("RECETARIO_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A cookie-holding client that follows redirects, for page flows.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A cookie-holding client that does NOT follow redirects, for
/// asserting on Location headers.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn manual_redirect_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique throwaway email for one test run.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.example", uuid::Uuid::new_v4())
}

/// Register a fresh account on `client`, leaving it logged in.
///
/// # Panics
///
/// Panics if the registration request fails or is rejected.
pub async fn register(client: &Client, email: &str, display_name: &str) {
    let resp = client
        .post(format!("{}/auth/register", base_url()))
        .form(&[
            ("email", email),
            ("display_name", display_name),
            ("password", TEST_PASSWORD),
            ("password_confirm", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to send registration");

    assert!(
        resp.status().is_success() || resp.status().is_redirection(),
        "registration rejected: {}",
        resp.status()
    );
}

/// Password used for all throwaway test accounts.
pub const TEST_PASSWORD: &str = "integration-test-password";
