//! Single-mutation executor for interactive controls.
//!
//! Wraps one fallible async mutation (toggle a like, save a note, delete a
//! recipe) with a busy flag, success/error notification and lifecycle
//! callbacks. Callers branch on the returned result, e.g. redirecting only
//! when the mutation succeeded.
//!
//! The executor guards a single in-flight mutation per control; it does not
//! itself prevent overlapping invocations - the triggering control is
//! expected to be disabled while [`BusyFlag::is_busy`] reports true.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use futures::FutureExt;

use super::{ActionError, ActionResult};
use crate::error::ErrorCode;
use crate::notify::Notices;

// =============================================================================
// Busy Flag
// =============================================================================

/// Shared in-flight indicator for one interactive control.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Create a flag in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mutation is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark busy; the returned guard resets the flag when dropped, on every
    /// exit path including unwinding.
    fn guard(&self) -> BusyGuard {
        self.0.store(true, Ordering::Release);
        BusyGuard(Arc::clone(&self.0))
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// How to notify the user when the mutation fails.
///
/// `Silent` is an explicit sentinel, distinguishable from "no override
/// provided": it suppresses the toast while the error callback still fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorNotice {
    /// Resolve the message from the error itself.
    #[default]
    Default,
    /// Show this message instead of the resolved one.
    Message(String),
    /// Show no toast at all.
    Silent,
}

/// Failure details handed to the error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedError {
    /// The message resolved for user display (override, else code lookup,
    /// else cleaned raw message).
    pub message: String,
    /// Symbolic failure code.
    pub code: ErrorCode,
    /// HTTP status when the failure maps to one.
    pub status: Option<StatusCode>,
    /// The original, unresolved message.
    pub raw: String,
}

type SuccessCallback<'a, T> = Box<dyn FnOnce(&T) + Send + 'a>;
type ErrorCallback<'a> = Box<dyn FnOnce(&ResolvedError) + Send + 'a>;
type SettledCallback<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Builder for executing one mutation.
pub struct Mutation<'a, T> {
    busy: Option<&'a BusyFlag>,
    success_message: Option<String>,
    error_notice: ErrorNotice,
    on_success: Option<SuccessCallback<'a, T>>,
    on_error: Option<ErrorCallback<'a>>,
    on_settled: Option<SettledCallback<'a>>,
}

impl<T> Default for Mutation<'_, T> {
    fn default() -> Self {
        Self {
            busy: None,
            success_message: None,
            error_notice: ErrorNotice::Default,
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }
}

impl<'a, T> Mutation<'a, T> {
    /// Create a mutation with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track in-flight state on `flag` for the span of the operation.
    #[must_use]
    pub fn busy(mut self, flag: &'a BusyFlag) -> Self {
        self.busy = Some(flag);
        self
    }

    /// Toast this message when the mutation succeeds.
    #[must_use]
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Override (or silence) the failure toast.
    #[must_use]
    pub fn error_notice(mut self, notice: ErrorNotice) -> Self {
        self.error_notice = notice;
        self
    }

    /// Invoke with the value when the mutation succeeds.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'a) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Invoke with the resolved failure when the mutation fails.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(&ResolvedError) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Invoke after the mutation settles, success or failure.
    #[must_use]
    pub fn on_settled(mut self, f: impl FnOnce() + Send + 'a) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }

    /// Execute the mutation.
    ///
    /// The busy flag (if any) is true for the entire span of `op` and false
    /// immediately after, regardless of outcome. A panic inside `op` is
    /// caught and treated as a failure with [`ErrorCode::Unknown`].
    ///
    /// Returns the settled result; `result.is_ok()` is the overall-success
    /// signal for follow-up control flow.
    pub async fn run<F>(self, notices: &mut Notices, op: F) -> ActionResult<T>
    where
        F: Future<Output = ActionResult<T>>,
    {
        let guard = self.busy.map(BusyFlag::guard);

        let result = AssertUnwindSafe(op).catch_unwind().await.unwrap_or_else(|_| {
            Err(ActionError::new(
                ErrorCode::Unknown,
                "operation panicked unexpectedly",
            ))
        });

        drop(guard);

        match &result {
            Ok(value) => {
                if let Some(f) = self.on_success {
                    f(value);
                }
                if let Some(message) = self.success_message {
                    notices.success(message);
                }
            }
            Err(err) => {
                let message = match &self.error_notice {
                    ErrorNotice::Message(override_message) => override_message.clone(),
                    ErrorNotice::Default | ErrorNotice::Silent => err.user_message(),
                };
                if self.error_notice != ErrorNotice::Silent {
                    notices.error(message.clone());
                }
                if let Some(f) = self.on_error {
                    f(&ResolvedError {
                        message,
                        code: err.code,
                        status: err.status,
                        raw: err.message.clone(),
                    });
                }
            }
        }

        if let Some(f) = self.on_settled {
            f();
        }

        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn validation_error(msg: &str) -> ActionError {
        ActionError::new(ErrorCode::Validation, msg)
    }

    #[tokio::test]
    async fn test_busy_flag_spans_operation_on_success() {
        let flag = BusyFlag::new();
        let mut notices = Notices::new();

        let observed = flag.clone();
        let result = Mutation::new()
            .busy(&flag)
            .run(&mut notices, async move {
                assert!(observed.is_busy());
                Ok(1)
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert!(!flag.is_busy());
    }

    #[tokio::test]
    async fn test_busy_flag_reset_on_failure() {
        let flag = BusyFlag::new();
        let mut notices = Notices::new();

        let result: ActionResult<()> = Mutation::new()
            .busy(&flag)
            .run(&mut notices, async { Err(validation_error("nope")) })
            .await;

        assert!(result.is_err());
        assert!(!flag.is_busy());
    }

    #[tokio::test]
    async fn test_panic_becomes_unknown_failure_and_resets_busy() {
        let flag = BusyFlag::new();
        let mut notices = Notices::new();

        let result: ActionResult<()> = Mutation::new()
            .busy(&flag)
            .run(&mut notices, async { panic!("boom") })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(err.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!flag.is_busy());
        // The failure was still notified.
        assert_eq!(notices.len(), 1);
    }

    #[tokio::test]
    async fn test_success_path_notifies_and_calls_back() {
        let mut notices = Notices::new();
        let seen = Mutex::new(None);

        let result = Mutation::new()
            .success_message("Recipe saved")
            .on_success(|value: &i32| {
                *seen.lock().unwrap() = Some(*value);
            })
            .run(&mut notices, async { Ok(5) })
            .await;

        assert!(result.is_ok());
        assert_eq!(*seen.lock().unwrap(), Some(5));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices.toasts()[0].message, "Recipe saved");
    }

    #[tokio::test]
    async fn test_silent_override_suppresses_toast_but_not_callback() {
        let mut notices = Notices::new();
        let seen = Mutex::new(None);

        let result: ActionResult<()> = Mutation::new()
            .error_notice(ErrorNotice::Silent)
            .on_error(|err| {
                *seen.lock().unwrap() = Some(err.clone());
            })
            .run(&mut notices, async { Err(validation_error("bad title")) })
            .await;

        assert!(result.is_err());
        assert!(notices.is_empty());

        let resolved = seen.lock().unwrap().clone().unwrap();
        // The callback still receives the resolved message.
        assert_eq!(resolved.message, "bad title");
        assert_eq!(resolved.code, ErrorCode::Validation);
        assert_eq!(resolved.raw, "bad title");
    }

    #[tokio::test]
    async fn test_message_override_replaces_resolved_message() {
        let mut notices = Notices::new();

        let _: ActionResult<()> = Mutation::new()
            .error_notice(ErrorNotice::Message("Could not save".into()))
            .run(&mut notices, async { Err(validation_error("raw detail")) })
            .await;

        assert_eq!(notices.toasts()[0].message, "Could not save");
    }

    #[tokio::test]
    async fn test_settled_callback_runs_on_both_outcomes() {
        let mut notices = Notices::new();
        let count = Mutex::new(0);

        let _ = Mutation::new()
            .on_settled(|| *count.lock().unwrap() += 1)
            .run(&mut notices, async { Ok(()) })
            .await;
        let _: ActionResult<()> = Mutation::new()
            .on_settled(|| *count.lock().unwrap() += 1)
            .run(&mut notices, async { Err(validation_error("x")) })
            .await;

        assert_eq!(*count.lock().unwrap(), 2);
    }
}
