//! HTMX fragment handlers for the interactive recipe controls.
//!
//! Each handler runs one mutation and re-renders the control it belongs to,
//! so the page swaps the fragment in place. Failures come back as an inline
//! error fragment with the mutation's resolved message and status; the
//! session toast is suppressed because a full page render never happens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use recetario_core::RecipeId;

use crate::db::{BookmarkRepository, LikeRepository, NoteRepository};
use crate::error::{AppError, ErrorCode};
use crate::fetch::{ActionError, ErrorNotice, Mutation};
use crate::middleware::RequireAuth;
use crate::models::RecipeNote;
use crate::notify::Notices;
use crate::state::AppState;

// =============================================================================
// Fragment Templates
// =============================================================================

/// Like button fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/like_button.html")]
pub struct LikeButtonTemplate {
    pub recipe_id: RecipeId,
    pub liked: bool,
    pub like_count: i64,
}

/// Bookmark button fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/bookmark_button.html")]
pub struct BookmarkButtonTemplate {
    pub recipe_id: RecipeId,
    pub bookmarked: bool,
}

/// Notes list fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/notes.html")]
pub struct NotesTemplate {
    pub recipe_id: RecipeId,
    pub notes: Vec<RecipeNote>,
    pub viewer_id: Option<recetario_core::UserId>,
}

/// Inline error fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/fragment_error.html")]
struct FragmentErrorTemplate {
    message: String,
}

/// Render a mutation failure inline.
fn error_fragment(err: &ActionError) -> Response {
    let status = err.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        FragmentErrorTemplate {
            message: err.user_message(),
        },
    )
        .into_response()
}

// =============================================================================
// Likes and Bookmarks
// =============================================================================

/// Toggle the viewer's like on a recipe and re-render the button.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn toggle_like(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Response {
    let id = RecipeId::new(id);
    let likes = LikeRepository::new(state.pool());
    let mut notices = Notices::new();

    let result = Mutation::new()
        .error_notice(ErrorNotice::Silent)
        .run(&mut notices, async {
            let liked = likes.toggle(user.id, id).await?;
            let count = likes.count(id).await?;
            Ok((liked, count))
        })
        .await;

    match result {
        Ok((liked, like_count)) => LikeButtonTemplate {
            recipe_id: id,
            liked,
            like_count,
        }
        .into_response(),
        Err(err) => error_fragment(&err),
    }
}

/// Toggle the viewer's bookmark on a recipe and re-render the button.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Response {
    let id = RecipeId::new(id);
    let bookmarks = BookmarkRepository::new(state.pool());
    let mut notices = Notices::new();

    let result = Mutation::new()
        .error_notice(ErrorNotice::Silent)
        .run(&mut notices, async {
            bookmarks.toggle(user.id, id).await.map_err(Into::into)
        })
        .await;

    match result {
        Ok(bookmarked) => BookmarkButtonTemplate {
            recipe_id: id,
            bookmarked,
        }
        .into_response(),
        Err(err) => error_fragment(&err),
    }
}

// =============================================================================
// Notes
// =============================================================================

/// Note form data.
#[derive(Debug, Deserialize)]
pub struct NoteForm {
    pub body: String,
    /// Checkbox; present means shared with other viewers.
    pub shared: Option<String>,
}

/// Create or replace the viewer's note and re-render the notes list.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn upsert_note(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
    Form(form): Form<NoteForm>,
) -> Result<Response, AppError> {
    let id = RecipeId::new(id);

    if form.body.trim().is_empty() {
        return Ok(error_fragment(&ActionError::new(
            ErrorCode::Validation,
            "Write something before saving the note",
        )));
    }

    let notes = NoteRepository::new(state.pool());
    let mut notices = Notices::new();

    // Private by default; sharing is the explicit opt-in.
    let is_private = form.shared.is_none();

    let result = Mutation::new()
        .error_notice(ErrorNotice::Silent)
        .run(&mut notices, async {
            notes
                .upsert(user.id, id, &form.body, is_private)
                .await
                .map_err(Into::into)
        })
        .await;

    match result {
        Ok(_) => render_notes(&state, id, user.id).await,
        Err(err) => Ok(error_fragment(&err)),
    }
}

/// Delete the viewer's note and re-render the notes list.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn delete_note(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let id = RecipeId::new(id);
    let notes = NoteRepository::new(state.pool());
    let mut notices = Notices::new();

    let result = Mutation::new()
        .error_notice(ErrorNotice::Silent)
        .run(&mut notices, async {
            notes.delete(user.id, id).await.map_err(Into::into)
        })
        .await;

    match result {
        Ok(_) => render_notes(&state, id, user.id).await,
        Err(err) => Ok(error_fragment(&err)),
    }
}

async fn render_notes(
    state: &AppState,
    recipe_id: RecipeId,
    viewer_id: recetario_core::UserId,
) -> Result<Response, AppError> {
    let notes = NoteRepository::new(state.pool())
        .visible_for_recipe(recipe_id, Some(viewer_id))
        .await?;

    Ok(NotesTemplate {
        recipe_id,
        notes,
        viewer_id: Some(viewer_id),
    }
    .into_response())
}
