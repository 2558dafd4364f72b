//! Account route handlers: profile, own recipes and bookmarks.
//!
//! Everything here sits behind [`RequireAuth`]; an anonymous visitor is
//! redirected to login with the original path in `next`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{BookmarkRepository, ProfileRepository, RecipeRepository};
use crate::error::AppError;
use crate::fetch::Mutation;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Profile, RecipeSummary};
use crate::notify::{self, Notices, Toast};
use crate::state::AppState;
use crate::storage::{Bucket, MediaStore};

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub profile: Profile,
}

/// Own-recipes page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/recipes.html")]
pub struct MyRecipesTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub recipes: Vec<RecipeSummary>,
}

/// Bookmarks page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/bookmarks.html")]
pub struct BookmarksTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub recipes: Vec<RecipeSummary>,
}

// =============================================================================
// Profile
// =============================================================================

/// Display the profile form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<ProfileTemplate, AppError> {
    let Some(profile) = ProfileRepository::new(state.pool()).get(user.id).await? else {
        // The insert trigger creates a profile with every account; a missing
        // row here is data corruption, not a 404.
        return Err(AppError::Internal(format!(
            "no profile row for user {}",
            user.id
        )));
    };

    Ok(ProfileTemplate {
        toasts: notify::take(&session).await,
        user: Some(user),
        profile,
    })
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub display_name: String,
    pub bio: String,
}

/// Handle profile form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Response {
    let mut notices = Notices::new();

    let display_name = form.display_name.trim();
    if display_name.is_empty() {
        notices.error("Display name must not be empty");
        return finish_redirect(notices, &session, "/account").await;
    }

    let profiles = ProfileRepository::new(state.pool());
    let bio = form.bio.trim();

    let result = Mutation::new()
        .success_message("Profile saved")
        .run(&mut notices, async {
            profiles
                .update(
                    user.id,
                    display_name,
                    if bio.is_empty() { None } else { Some(bio) },
                )
                .await
                .map_err(Into::into)
        })
        .await;

    // Keep the session's display name in step with the profile.
    if result.is_ok() {
        let refreshed = CurrentUser {
            display_name: display_name.to_owned(),
            ..user
        };
        if let Err(e) = session
            .insert(crate::models::session_keys::CURRENT_USER, &refreshed)
            .await
        {
            tracing::warn!("Failed to refresh session user: {e}");
        }
    }

    finish_redirect(notices, &session, "/account").await
}

/// Upload or replace the avatar.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut notices = Notices::new();
    let profiles = ProfileRepository::new(state.pool());

    let Some((filename, bytes)) = read_avatar_field(&mut multipart).await? else {
        return Err(AppError::BadRequest("no avatar file submitted".to_owned()));
    };

    let old_url = profiles.get(user.id).await?.and_then(|p| p.avatar_url);
    let media = state.media();

    let result = Mutation::new()
        .success_message("Avatar updated")
        .run(&mut notices, async {
            let key = media
                .store(Bucket::Avatars, user.id, &filename, &bytes)
                .await?;
            let url = MediaStore::public_path(Bucket::Avatars, &key);
            profiles.set_avatar(user.id, Some(&url)).await?;
            if let Some(old) = old_url
                .as_deref()
                .and_then(|url| url.strip_prefix("/media/avatars/"))
            {
                media.delete(Bucket::Avatars, user.id, old).await?;
            }
            Ok(())
        })
        .await;

    drop(result);
    Ok(finish_redirect(notices, &session, "/account").await)
}

// =============================================================================
// Lists
// =============================================================================

/// List the user's own recipes, including private ones.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_recipes(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<MyRecipesTemplate, AppError> {
    let recipes = RecipeRepository::new(state.pool()).for_owner(user.id).await?;

    Ok(MyRecipesTemplate {
        toasts: notify::take(&session).await,
        user: Some(user),
        recipes,
    })
}

/// List the user's bookmarked recipes.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn bookmarks(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<BookmarksTemplate, AppError> {
    let recipes = BookmarkRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(BookmarksTemplate {
        toasts: notify::take(&session).await,
        user: Some(user),
        recipes,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Pull the `avatar` field out of a multipart body.
async fn read_avatar_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, axum::body::Bytes)>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("avatar") {
            let filename = field.file_name().unwrap_or("upload").to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if bytes.is_empty() {
                return Ok(None);
            }
            return Ok(Some((filename, bytes)));
        }
    }
    Ok(None)
}

/// Flush buffered notices and redirect.
async fn finish_redirect(notices: Notices, session: &Session, to: &str) -> Response {
    if let Err(e) = notices.flush(session).await {
        tracing::warn!("Failed to flush notices: {e}");
    }
    Redirect::to(to).into_response()
}
