//! Recipe route handlers: browse, detail, and the owner's create/edit/delete
//! flow.
//!
//! The detail page fans its reads out concurrently and settles them through
//! [`PageLoad`], so a failing side-read (like count, notes) degrades that
//! section instead of failing the page. Saves go through the mutation
//! executor and the atomic database procedures; a recipe is never half
//! written.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, RawForm, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use recetario_core::{CategoryId, RecipeId, TagId};

use crate::db::{
    BookmarkRepository, LikeRepository, NoteRepository, RecipeFilter, RecipeRepository,
    TaxonomyRepository,
};
use crate::error::AppError;
use crate::fetch::{ActionErrors, Mutation, PageLoad};
use crate::forms::RecipeForm;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{
    Category, CurrentUser, Instruction, Recipe, RecipeIngredient, RecipeNote, RecipeSummary, Tag,
};
use crate::notify::{self, Notices, Toast};
use crate::state::AppState;
use crate::storage::{Bucket, MediaStore};

// =============================================================================
// Query Types
// =============================================================================

/// Browse page query parameters.
#[derive(Debug, Deserialize, Default)]
pub struct BrowseQuery {
    pub q: Option<String>,
    pub category: Option<i64>,
    pub tag: Option<i64>,
    pub page: Option<u32>,
}

impl BrowseQuery {
    fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            query: self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(str::to_owned),
            category: self.category.map(CategoryId::new),
            tag: self.tag.map(TagId::new),
            page: self.page.unwrap_or(1).max(1),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Browse/search page template.
#[derive(Template, WebTemplate)]
#[template(path = "recipes/index.html")]
pub struct IndexTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub recipes: Vec<RecipeSummary>,
    pub categories: Vec<Category>,
    pub query: String,
    pub page: u32,
    /// Whether a full next page may exist.
    pub has_more: bool,
}

/// Recipe detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "recipes/show.html")]
pub struct ShowTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub recipe: Recipe,
    /// Duplicate of `recipe.id`, named for the shared button partials.
    pub recipe_id: RecipeId,
    pub viewer_id: Option<recetario_core::UserId>,
    pub author_name: String,
    pub is_owner: bool,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<Instruction>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub like_count: i64,
    pub liked: bool,
    pub bookmarked: bool,
    pub notes: Vec<RecipeNote>,
    pub errors: ActionErrors,
}

/// One prefilled ingredient row in the editor.
#[derive(Debug, Clone, Default)]
pub struct IngredientRow {
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub note: String,
}

/// Recipe editor template, shared by the new and edit pages.
#[derive(Template, WebTemplate)]
#[template(path = "recipes/form.html")]
pub struct FormTemplate {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    /// Form POST target.
    pub action: String,
    pub heading: String,
    pub title: String,
    pub description: String,
    pub prep_time_minutes: String,
    pub cooking_time_minutes: String,
    pub servings: String,
    pub difficulty: String,
    pub is_public: bool,
    pub source_url: String,
    pub ingredient_rows: Vec<IngredientRow>,
    pub instruction_rows: Vec<String>,
    pub all_categories: Vec<Category>,
    pub selected_categories: Vec<CategoryId>,
    pub tags: String,
}

/// Blank rows appended to the editor so there is always room to type.
const SPARE_ROWS: usize = 3;

impl FormTemplate {
    fn blank(
        user: CurrentUser,
        toasts: Vec<Toast>,
        all_categories: Vec<Category>,
    ) -> Self {
        let mut form = Self {
            user: Some(user),
            toasts,
            action: "/recipes".to_owned(),
            heading: "New recipe".to_owned(),
            title: String::new(),
            description: String::new(),
            prep_time_minutes: String::new(),
            cooking_time_minutes: String::new(),
            servings: String::new(),
            difficulty: "medium".to_owned(),
            is_public: true,
            source_url: String::new(),
            ingredient_rows: Vec::new(),
            instruction_rows: Vec::new(),
            all_categories,
            selected_categories: Vec::new(),
            tags: String::new(),
        };
        form.pad_rows();
        form
    }

    fn pad_rows(&mut self) {
        for _ in 0..SPARE_ROWS {
            self.ingredient_rows.push(IngredientRow::default());
            self.instruction_rows.push(String::new());
        }
    }

    fn category_selected(&self, id: &CategoryId) -> bool {
        self.selected_categories.contains(id)
    }
}

// =============================================================================
// Browse and Detail
// =============================================================================

/// Browse public recipes, optionally filtered by search text, category or
/// tag.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Query(query): Query<BrowseQuery>,
) -> Result<IndexTemplate, AppError> {
    let filter = query.filter();

    let recipe_repo = RecipeRepository::new(state.pool());
    let taxonomy = TaxonomyRepository::new(state.pool());
    let (recipes, categories) = tokio::join!(
        recipe_repo.list_public(&filter),
        taxonomy.categories(),
    );
    let recipes = recipes?;
    let categories = categories?;

    let has_more = recipes.len() == RecipeFilter::PAGE_SIZE as usize;

    Ok(IndexTemplate {
        user,
        toasts: notify::take(&session).await,
        recipes,
        categories,
        query: filter.query.unwrap_or_default(),
        page: filter.page,
        has_more,
    })
}

/// Display a recipe.
///
/// The recipe row itself is required; every side-read settles through the
/// page-load collector and falls back when it fails.
#[instrument(skip_all, fields(recipe_id = id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let id = RecipeId::new(id);
    let viewer = user.as_ref().map(|u| u.id);

    let pool = state.pool();
    let recipes = RecipeRepository::new(pool);
    let likes = LikeRepository::new(pool);
    let bookmarks = BookmarkRepository::new(pool);
    let notes = NoteRepository::new(pool);

    let mut notices = Notices::new();
    let mut load = PageLoad::new();

    let (
        recipe,
        ingredients,
        instructions,
        categories,
        tags,
        like_count,
        liked,
        bookmarked,
        visible_notes,
    ) = tokio::join!(
        recipes.get_visible(id, viewer),
        recipes.ingredients(id),
        recipes.instructions(id),
        recipes.categories(id),
        recipes.tags(id),
        likes.count(id),
        async {
            match viewer {
                Some(u) => likes.state(u, id).await,
                None => Ok(false),
            }
        },
        async {
            match viewer {
                Some(u) => bookmarks.state(u, id).await,
                None => Ok(false),
            }
        },
        notes.visible_for_recipe(id, viewer),
    );

    // Without the recipe there is nothing to degrade to.
    let Some((recipe, author_name)) = recipe? else {
        return Err(AppError::NotFound(format!("recipe {id}")));
    };

    let ingredients = load.resolve("ingredients", ingredients.map_err(Into::into), Vec::new());
    let instructions = load.resolve("instructions", instructions.map_err(Into::into), Vec::new());
    let categories = load.resolve("categories", categories.map_err(Into::into), Vec::new());
    let tags = load.resolve("tags", tags.map_err(Into::into), Vec::new());
    let like_count = load.resolve("likes", like_count.map_err(Into::into), 0);
    let liked = load.resolve("liked", liked.map_err(Into::into), false);
    let bookmarked = load.resolve("bookmarked", bookmarked.map_err(Into::into), false);
    let visible_notes = load.resolve("notes", visible_notes.map_err(Into::into), Vec::new());

    let errors = load.finish(&mut notices);
    if let Err(e) = notices.flush(&session).await {
        tracing::warn!("Failed to flush notices: {e}");
    }

    let is_owner = viewer == Some(recipe.owner_id);

    Ok(ShowTemplate {
        user,
        toasts: notify::take(&session).await,
        recipe,
        recipe_id: id,
        viewer_id: viewer,
        author_name,
        is_owner,
        ingredients,
        instructions,
        categories,
        tags,
        like_count,
        liked,
        bookmarked,
        notes: visible_notes,
        errors,
    }
    .into_response())
}

// =============================================================================
// Create
// =============================================================================

/// Display the new recipe form.
pub async fn new(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<FormTemplate, AppError> {
    let categories = TaxonomyRepository::new(state.pool()).categories().await?;
    Ok(FormTemplate::blank(
        user,
        notify::take(&session).await,
        categories,
    ))
}

/// Handle new recipe submission.
///
/// Validation runs before any database work; a form with no title or no
/// ingredient never opens a connection. The write itself is one atomic
/// procedure call.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    RawForm(body): RawForm,
) -> Response {
    let mut notices = Notices::new();
    let form = RecipeForm::parse(&body);

    let write = match form.validate() {
        Ok(write) => write,
        Err(e) => {
            notices.error(e.0);
            return finish_redirect(notices, &session, "/recipes/new").await;
        }
    };

    let recipes = RecipeRepository::new(state.pool());
    let taxonomy = TaxonomyRepository::new(state.pool());
    let tag_names = form.tag_names();

    let result = Mutation::new()
        .success_message("Recipe created")
        .run(&mut notices, async {
            let id = recipes.create_atomic(user.id, &write).await?;
            let mut tag_ids = Vec::with_capacity(tag_names.len());
            for name in &tag_names {
                tag_ids.push(taxonomy.upsert_tag(name).await?);
            }
            taxonomy.set_recipe_tags(id, &tag_ids).await?;
            Ok(id)
        })
        .await;

    match result {
        Ok(id) => finish_redirect(notices, &session, &format!("/recipes/{id}")).await,
        Err(_) => finish_redirect(notices, &session, "/recipes/new").await,
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Display the edit form for an owned recipe.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Result<FormTemplate, AppError> {
    let id = RecipeId::new(id);
    let recipes = RecipeRepository::new(state.pool());
    let taxonomy = TaxonomyRepository::new(state.pool());

    let Some((recipe, _)) = recipes.get_visible(id, Some(user.id)).await? else {
        return Err(AppError::NotFound(format!("recipe {id}")));
    };
    if recipe.owner_id != user.id {
        return Err(AppError::NotFound(format!("recipe {id}")));
    }

    let (ingredients, instructions, selected, tags, all_categories) = tokio::join!(
        recipes.ingredients(id),
        recipes.instructions(id),
        recipes.categories(id),
        recipes.tags(id),
        taxonomy.categories(),
    );

    let tags = tags?
        .into_iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut template = FormTemplate {
        user: Some(user),
        toasts: notify::take(&session).await,
        action: format!("/recipes/{id}"),
        heading: format!("Edit {}", recipe.title),
        title: recipe.title,
        description: recipe.description.unwrap_or_default(),
        prep_time_minutes: recipe
            .prep_time_minutes
            .map(|m| m.to_string())
            .unwrap_or_default(),
        cooking_time_minutes: recipe
            .cooking_time_minutes
            .map(|m| m.to_string())
            .unwrap_or_default(),
        servings: recipe.servings.map(|s| s.to_string()).unwrap_or_default(),
        difficulty: recipe.difficulty.as_str().to_owned(),
        is_public: recipe.is_public,
        source_url: recipe.source_url.unwrap_or_default(),
        ingredient_rows: ingredients?
            .into_iter()
            .map(|i| IngredientRow {
                name: i.name,
                quantity: i.quantity.unwrap_or_default(),
                unit: i.unit.unwrap_or_default(),
                note: i.note.unwrap_or_default(),
            })
            .collect(),
        instruction_rows: instructions?.into_iter().map(|s| s.content).collect(),
        all_categories: all_categories?,
        selected_categories: selected?.into_iter().map(|c| c.id).collect(),
        tags,
    };
    template.pad_rows();
    Ok(template)
}

/// Handle recipe update submission. Ownership is verified inside the
/// atomic procedure; a non-owner gets a not-found outcome.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> Response {
    let id = RecipeId::new(id);
    let mut notices = Notices::new();
    let form = RecipeForm::parse(&body);

    let write = match form.validate() {
        Ok(write) => write,
        Err(e) => {
            notices.error(e.0);
            return finish_redirect(notices, &session, &format!("/recipes/{id}/edit")).await;
        }
    };

    let recipes = RecipeRepository::new(state.pool());
    let taxonomy = TaxonomyRepository::new(state.pool());
    let tag_names = form.tag_names();

    let result = Mutation::new()
        .success_message("Recipe saved")
        .run(&mut notices, async {
            recipes.update_atomic(id, user.id, &write).await?;
            let mut tag_ids = Vec::with_capacity(tag_names.len());
            for name in &tag_names {
                tag_ids.push(taxonomy.upsert_tag(name).await?);
            }
            taxonomy.set_recipe_tags(id, &tag_ids).await?;
            Ok(())
        })
        .await;

    match result {
        Ok(()) => finish_redirect(notices, &session, &format!("/recipes/{id}")).await,
        Err(_) => finish_redirect(notices, &session, &format!("/recipes/{id}/edit")).await,
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Delete an owned recipe. Children cascade in the database.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let id = RecipeId::new(id);
    let mut notices = Notices::new();
    let recipes = RecipeRepository::new(state.pool());

    let result = Mutation::new()
        .success_message("Recipe deleted")
        .run(&mut notices, async {
            recipes.delete(id, user.id).await.map_err(Into::into)
        })
        .await;

    match result {
        Ok(()) => finish_redirect(notices, &session, "/account/recipes").await,
        Err(_) => finish_redirect(notices, &session, &format!("/recipes/{id}")).await,
    }
}

// =============================================================================
// Image Upload
// =============================================================================

/// Upload or replace the recipe image.
///
/// The new file is stored first and the old one removed only after the
/// database points at the new key, so a failed write never leaves the
/// recipe with a dangling image.
#[instrument(skip_all, fields(recipe_id = id, user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let id = RecipeId::new(id);
    let mut notices = Notices::new();
    let recipes = RecipeRepository::new(state.pool());

    let Some((recipe, _)) = recipes.get_visible(id, Some(user.id)).await? else {
        return Err(AppError::NotFound(format!("recipe {id}")));
    };
    if recipe.owner_id != user.id {
        return Err(AppError::NotFound(format!("recipe {id}")));
    }

    let Some((filename, bytes)) = read_image_field(&mut multipart).await? else {
        return Err(AppError::BadRequest("no image file submitted".to_owned()));
    };

    let media = state.media();
    let old_key = recipe
        .image_url
        .as_deref()
        .and_then(|url| media_key(url, Bucket::RecipeImages));

    let result = Mutation::new()
        .success_message("Image updated")
        .run(&mut notices, async {
            let key = media
                .store(Bucket::RecipeImages, user.id, &filename, &bytes)
                .await?;
            let url = MediaStore::public_path(Bucket::RecipeImages, &key);
            recipes.set_image(id, user.id, Some(&url)).await?;
            if let Some(old) = old_key {
                media.delete(Bucket::RecipeImages, user.id, old).await?;
            }
            Ok(())
        })
        .await;

    drop(result);
    Ok(finish_redirect(notices, &session, &format!("/recipes/{id}")).await)
}

/// Pull the `image` field out of a multipart body.
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, axum::body::Bytes)>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("image") {
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

/// Extract the object key from a public media path for the given bucket.
fn media_key(url: &str, bucket: Bucket) -> Option<&str> {
    url.strip_prefix("/media/")?.strip_prefix(bucket.name())?.strip_prefix('/')
        .filter(|key| !key.is_empty())
}

/// Flush buffered notices and redirect.
async fn finish_redirect(notices: Notices, session: &Session, to: &str) -> Response {
    if let Err(e) = notices.flush(session).await {
        tracing::warn!("Failed to flush notices: {e}");
    }
    Redirect::to(to).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_key_extraction() {
        assert_eq!(
            media_key("/media/recipe-images/7/abc.png", Bucket::RecipeImages),
            Some("7/abc.png")
        );
        assert_eq!(media_key("/media/avatars/7/abc.png", Bucket::RecipeImages), None);
        assert_eq!(media_key("https://cdn.example/x.png", Bucket::RecipeImages), None);
        assert_eq!(media_key("/media/recipe-images/", Bucket::RecipeImages), None);
    }

    #[test]
    fn test_browse_query_filter() {
        let query = BrowseQuery {
            q: Some("  tortilla  ".into()),
            category: Some(2),
            tag: None,
            page: Some(0),
        };
        let filter = query.filter();
        assert_eq!(filter.query.as_deref(), Some("tortilla"));
        assert_eq!(filter.category, Some(CategoryId::new(2)));
        // Page 0 clamps to 1.
        assert_eq!(filter.page, 1);

        let blank = BrowseQuery {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.filter().query, None);
    }
}
