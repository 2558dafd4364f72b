//! Parallel data-fetch aggregation for server-rendered pages.
//!
//! A page is composed of several independent reads (the recipe, its like
//! count, the viewer's bookmark state, notes, ...). They are fanned out
//! concurrently and settled through a [`PageLoad`] collector:
//!
//! - every action resolves to its value on success, or a configured fallback
//!   on failure, so a partially-available page still renders;
//! - failures land in an ordered error map keyed by action name, letting the
//!   template distinguish "fell back" from "succeeded";
//! - [`PageLoad::finish`] queues exactly one toast per failed action.
//!
//! Aggregation never short-circuits: all actions run to completion, and a
//! failing action cannot suppress a slower sibling's value. There are no
//! retries, timeouts or cancellation here; a hanging read hangs the page.
//!
//! ```rust,ignore
//! let mut load = PageLoad::new();
//! let (recipe, likes, notes) = tokio::join!(
//!     recipes.get(id, viewer),
//!     likes.count(id),
//!     notes.visible_for_recipe(id, viewer),
//! );
//! let recipe = load.resolve_opt("recipe", recipe.map_err(Into::into));
//! let likes = load.resolve("likes", likes.map_err(Into::into), 0);
//! let notes = load.resolve("notes", notes.map_err(Into::into), Vec::new());
//! let errors = load.finish(&mut notices);
//! ```

pub mod mutation;

pub use mutation::{ErrorNotice, Mutation};

use std::collections::BTreeMap;

use axum::http::StatusCode;
use futures::future::{BoxFuture, FutureExt, join_all};

use crate::db::RepositoryError;
use crate::error::{self, ErrorCode};
use crate::notify::Notices;
use crate::storage::StorageError;

// =============================================================================
// Action Results
// =============================================================================

/// Normalized failure of a single page action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    /// Symbolic failure code.
    pub code: ErrorCode,
    /// Raw (internal) message, cleaned before display.
    pub message: String,
    /// HTTP status when the failure maps to one.
    pub status: Option<StatusCode>,
}

impl ActionError {
    /// Create an error with the code's conventional status.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: Some(code.status()),
        }
    }

    /// Resolve the user-facing message: the fixed code lookup when one
    /// exists, else the cleaned raw message.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.code.default_message().map_or_else(
            || error::clean_message(&self.message).to_string(),
            ToString::to_string,
        )
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<RepositoryError> for ActionError {
    fn from(err: RepositoryError) -> Self {
        let code = match &err {
            RepositoryError::NotFound => ErrorCode::NotFound,
            RepositoryError::Conflict(_) => ErrorCode::Validation,
            RepositoryError::DataCorruption(_) => ErrorCode::Server,
            RepositoryError::Database(db) => match db {
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                    ErrorCode::Network
                }
                sqlx::Error::RowNotFound => ErrorCode::NotFound,
                _ => ErrorCode::Server,
            },
        };
        Self::new(code, err.to_string())
    }
}

impl From<StorageError> for ActionError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::NotOwner => ErrorCode::Forbidden,
            StorageError::InvalidExtension(_) | StorageError::TooLarge { .. } => {
                ErrorCode::Validation
            }
            StorageError::Io(_) => ErrorCode::Server,
        };
        Self::new(code, err.to_string())
    }
}

/// Outcome of a single named action.
pub type ActionResult<T> = Result<T, ActionError>;

/// Ordered map of action name to failure, for actions that failed.
///
/// Successful actions have no entry; the template layer checks membership to
/// tell a fallback value apart from a real one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionErrors(BTreeMap<&'static str, ActionError>);

impl ActionErrors {
    /// The failure recorded for `name`, if that action failed.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionError> {
        self.0.get(name)
    }

    /// Whether the named action failed.
    #[must_use]
    pub fn failed(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of failed actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every action succeeded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate failures in action-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ActionError)> {
        self.0.iter().map(|(name, err)| (*name, err))
    }
}

// =============================================================================
// Page Load Collector
// =============================================================================

/// Collector that settles the outcomes of concurrently-run page actions.
///
/// Pair with `tokio::join!` so all operations start together and none is
/// abandoned when a sibling fails.
#[derive(Debug, Default)]
pub struct PageLoad {
    errors: ActionErrors,
}

impl PageLoad {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle a named action: its value on success, `fallback` on failure.
    ///
    /// A failure is recorded under `name`; resolving two actions under the
    /// same name keeps the first failure.
    pub fn resolve<T>(&mut self, name: &'static str, outcome: ActionResult<T>, fallback: T) -> T {
        match outcome {
            Ok(value) => value,
            Err(err) => {
                self.errors.0.entry(name).or_insert(err);
                fallback
            }
        }
    }

    /// Settle a named action with no fallback value.
    pub fn resolve_opt<T>(&mut self, name: &'static str, outcome: ActionResult<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.0.entry(name).or_insert(err);
                None
            }
        }
    }

    /// Failures recorded so far.
    #[must_use]
    pub const fn errors(&self) -> &ActionErrors {
        &self.errors
    }

    /// Finish the aggregate call: queue one error toast per failed action
    /// (keyed by action name, so repeats cannot double-notify) and hand the
    /// error map to the rendering layer.
    #[must_use]
    pub fn finish(self, notices: &mut Notices) -> ActionErrors {
        for (_, err) in self.errors.iter() {
            notices.error(err.user_message());
        }
        self.errors
    }
}

// =============================================================================
// Homogeneous Action Sets
// =============================================================================

/// A named operation with an optional fallback, for same-typed action sets.
pub struct Action<T> {
    name: &'static str,
    fallback: Option<T>,
    op: BoxFuture<'static, ActionResult<T>>,
}

impl<T> Action<T> {
    /// Create a named action.
    pub fn new<F>(name: &'static str, op: F) -> Self
    where
        F: Future<Output = ActionResult<T>> + Send + 'static,
    {
        Self {
            name,
            fallback: None,
            op: op.boxed(),
        }
    }

    /// Substitute `fallback` for this action's value if it fails.
    #[must_use]
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Result of [`gather`]: values by action name plus the failure map.
///
/// A failed action with no fallback is absent from `values`; with a
/// fallback it is present under its name and also listed in `errors`.
#[derive(Debug, Default)]
pub struct Gathered<T> {
    pub values: BTreeMap<&'static str, T>,
    pub errors: ActionErrors,
}

impl<T> Gathered<T> {
    /// Queue one error toast per failed action and return the error map.
    #[must_use]
    pub fn notify(self, notices: &mut Notices) -> (BTreeMap<&'static str, T>, ActionErrors) {
        for (_, err) in self.errors.iter() {
            notices.error(err.user_message());
        }
        (self.values, self.errors)
    }
}

/// Run a set of same-typed named actions concurrently and settle them all.
///
/// All operations are started together and every one is driven to
/// completion; a failure never cancels or hides a sibling's result.
pub async fn gather<T>(actions: Vec<Action<T>>) -> Gathered<T> {
    let mut names = Vec::with_capacity(actions.len());
    let mut fallbacks = Vec::with_capacity(actions.len());
    let mut ops = Vec::with_capacity(actions.len());
    for action in actions {
        names.push(action.name);
        fallbacks.push(action.fallback);
        ops.push(action.op);
    }

    let outcomes = join_all(ops).await;

    let mut gathered = Gathered {
        values: BTreeMap::new(),
        errors: ActionErrors::default(),
    };
    for ((name, fallback), outcome) in names.into_iter().zip(fallbacks).zip(outcomes) {
        match outcome {
            Ok(value) => {
                gathered.values.insert(name, value);
            }
            Err(err) => {
                gathered.errors.0.insert(name, err);
                if let Some(value) = fallback {
                    gathered.values.insert(name, value);
                }
            }
        }
    }
    gathered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fail(msg: &str) -> ActionError {
        ActionError::new(ErrorCode::Server, msg)
    }

    #[tokio::test]
    async fn test_gather_yields_entry_per_action() {
        // Three actions, one failing with a fallback: all three names appear
        // in values, exactly one in errors.
        let gathered = gather(vec![
            Action::new("latest", async { Ok(vec![1, 2]) }),
            Action::new("popular", async { Err(fail("boom")) }).with_fallback(vec![]),
            Action::new("mine", async { Ok(vec![3]) }),
        ])
        .await;

        assert_eq!(gathered.values.len(), 3);
        assert_eq!(gathered.values.get("latest").unwrap(), &vec![1, 2]);
        assert_eq!(gathered.values.get("popular").unwrap(), &Vec::<i32>::new());
        assert_eq!(gathered.errors.len(), 1);
        assert!(gathered.errors.failed("popular"));
        assert!(!gathered.errors.failed("latest"));
    }

    #[tokio::test]
    async fn test_gather_no_fallback_leaves_value_absent() {
        let gathered = gather(vec![
            Action::<i32>::new("broken", async { Err(fail("no")) }),
            Action::new("fine", async { Ok(7) }),
        ])
        .await;

        assert!(!gathered.values.contains_key("broken"));
        assert!(gathered.errors.failed("broken"));
        assert_eq!(gathered.values.get("fine"), Some(&7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gather_does_not_short_circuit() {
        // A fast failure must not prevent the slower sibling's value from
        // appearing in the result.
        let gathered = gather(vec![
            Action::<u32>::new("fast-failure", async { Err(fail("immediately")) }),
            Action::new("slow-success", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(42)
            }),
        ])
        .await;

        assert_eq!(gathered.values.get("slow-success"), Some(&42));
        assert!(gathered.errors.failed("fast-failure"));
    }

    #[tokio::test]
    async fn test_page_load_resolve_and_error_map() {
        let mut load = PageLoad::new();

        let recipes = load.resolve("recipes", Ok(vec!["flan"]), Vec::new());
        let count: i64 = load.resolve("likes", Err(fail("db down")), 0);
        let missing: Option<String> = load.resolve_opt("note", Err(fail("db down")));

        assert_eq!(recipes, vec!["flan"]);
        assert_eq!(count, 0);
        assert!(missing.is_none());

        let errors = load.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.failed("likes"));
        assert!(errors.failed("note"));
        assert!(!errors.failed("recipes"));
    }

    #[tokio::test]
    async fn test_finish_notifies_once_per_failed_action() {
        let mut load = PageLoad::new();
        let _: i32 = load.resolve("a", Err(fail("first")), 0);
        // Same action settled twice keeps the first failure, no double toast.
        let _: i32 = load.resolve("a", Err(fail("second")), 0);
        let _: i32 = load.resolve("b", Ok(1), 0);

        let mut notices = Notices::new();
        let errors = load.finish(&mut notices);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("a").unwrap().message, "first");
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn test_user_message_prefers_code_lookup() {
        let err = ActionError::new(ErrorCode::Server, "sqlx blew up");
        assert_eq!(err.user_message(), "Something went wrong on our side");

        // Validation has no lookup entry: raw message, cleaned, is shown.
        let err = ActionError::new(
            ErrorCode::Validation,
            "database error: title already taken",
        );
        assert_eq!(err.user_message(), "title already taken");
    }

    #[tokio::test]
    async fn test_mutation_types_usable_from_module_root() {
        // Handlers import these as `crate::fetch::{ErrorNotice, Mutation}`.
        use crate::fetch::{ErrorNotice, Mutation};

        let mut notices = Notices::new();
        let result: ActionResult<()> = Mutation::new()
            .error_notice(ErrorNotice::Silent)
            .run(&mut notices, async { Err(fail("quiet")) })
            .await;

        assert!(result.is_err());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ActionError = RepositoryError::NotFound.into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ActionError = RepositoryError::Conflict("slug taken".into()).into();
        assert_eq!(err.code, ErrorCode::Validation);

        let err: ActionError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code, ErrorCode::Network);
    }
}
