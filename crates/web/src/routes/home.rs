//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{CategoryCount, RecipeRepository, TaxonomyRepository};
use crate::fetch::{Action, ActionErrors, gather};
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, RecipeSummary};
use crate::notify::{self, Notices, Toast};
use crate::state::AppState;

/// Number of recipes in each home page rail.
const RECIPES_PER_RAIL: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    /// Most recently published recipes.
    pub latest: Vec<RecipeSummary>,
    /// Most liked recipes.
    pub popular: Vec<RecipeSummary>,
    /// Categories with public-recipe counts.
    pub categories: Vec<CategoryCount>,
    /// Failed page actions, by name.
    pub errors: ActionErrors,
}

/// Display the home page.
///
/// The two recipe rails load concurrently; if one fails the other still
/// renders, with an empty rail and a toast for the failed one.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> impl IntoResponse {
    let mut notices = Notices::new();

    let latest_pool = state.pool().clone();
    let popular_pool = state.pool().clone();
    let taxonomy = TaxonomyRepository::new(state.pool());
    let (gathered, categories) = tokio::join!(
        gather(vec![
            Action::new("latest", async move {
                RecipeRepository::new(&latest_pool)
                    .latest(RECIPES_PER_RAIL)
                    .await
                    .map_err(Into::into)
            })
            .with_fallback(Vec::new()),
            Action::new("popular", async move {
                RecipeRepository::new(&popular_pool)
                    .popular(RECIPES_PER_RAIL)
                    .await
                    .map_err(Into::into)
            })
            .with_fallback(Vec::new()),
        ]),
        taxonomy.categories_with_counts(),
    );

    let (mut rails, errors) = gathered.notify(&mut notices);
    let latest = rails.remove("latest").unwrap_or_default();
    let popular = rails.remove("popular").unwrap_or_default();

    let categories = categories.unwrap_or_else(|e| {
        tracing::error!("Failed to load categories: {e}");
        Vec::new()
    });

    if let Err(e) = notices.flush(&session).await {
        tracing::warn!("Failed to flush notices: {e}");
    }
    let toasts = notify::take(&session).await;

    HomeTemplate {
        user,
        toasts,
        latest,
        popular,
        categories,
        errors,
    }
}
