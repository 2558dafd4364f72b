//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Health check
//! GET  /health/ready             - Readiness check (database ping)
//!
//! # Recipes
//! GET  /recipes                  - Browse/search public recipes
//! GET  /recipes/new              - New recipe form
//! POST /recipes                  - Create recipe
//! GET  /recipes/{id}             - Recipe detail
//! GET  /recipes/{id}/edit        - Edit recipe form
//! POST /recipes/{id}             - Update recipe
//! POST /recipes/{id}/delete      - Delete recipe
//! POST /recipes/{id}/image       - Upload recipe image
//!
//! # Fragments (HTMX)
//! POST /recipes/{id}/like        - Toggle like (returns like button)
//! POST /recipes/{id}/bookmark    - Toggle bookmark (returns bookmark button)
//! POST /recipes/{id}/notes       - Create/update own note (returns notes list)
//! POST /recipes/{id}/notes/delete - Delete own note (returns notes list)
//!
//! # Auth
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action
//! GET  /auth/register            - Register page
//! POST /auth/register            - Register action
//! POST /auth/logout              - Logout action
//!
//! # Account (requires auth)
//! GET  /account                  - Profile form
//! POST /account/profile          - Update profile
//! POST /account/avatar           - Upload avatar
//! GET  /account/recipes          - Own recipes, including private
//! GET  /account/bookmarks        - Bookmarked recipes
//! ```

pub mod account;
pub mod auth;
pub mod fragments;
pub mod home;
pub mod recipes;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, mutation_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    let fragments = Router::new()
        .route("/{id}/like", post(fragments::toggle_like))
        .route("/{id}/bookmark", post(fragments::toggle_bookmark))
        .route("/{id}/notes", post(fragments::upsert_note))
        .route("/{id}/notes/delete", post(fragments::delete_note))
        .layer(mutation_rate_limiter());

    Router::new()
        .route("/", get(recipes::index).post(recipes::create))
        .route("/new", get(recipes::new))
        .route("/{id}", get(recipes::show).post(recipes::update))
        .route("/{id}/edit", get(recipes::edit))
        .route("/{id}/delete", post(recipes::delete))
        .route("/{id}/image", post(recipes::upload_image))
        .merge(fragments)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/avatar", post(account::upload_avatar))
        .route("/recipes", get(account::my_recipes))
        .route("/bookmarks", get(account::bookmarks))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/recipes", recipe_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
