//! Postgres-backed session layer.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::SiteConfig;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "recetario_session";

/// Sessions idle out after a week of inactivity.
const IDLE_EXPIRY: Duration = Duration::days(7);

/// Build the tower-sessions layer over the shared pool.
///
/// The backing `tower_sessions.session` table is created by migration, not
/// by the store itself. The cookie is marked secure only when the site is
/// actually served over HTTPS, so local development still works.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &SiteConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    let over_https = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(IDLE_EXPIRY))
        .with_secure(over_https)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
