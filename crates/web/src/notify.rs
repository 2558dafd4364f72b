//! User-facing toast notifications.
//!
//! Failed page actions and settled mutations surface to the user as toasts.
//! Toasts are buffered in a [`Notices`] value while a handler runs, then
//! flushed to the session at the end; the base template drains the queue on
//! the next render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key for the pending toast queue.
const TOASTS_KEY: &str = "toasts";

/// Severity of a toast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    /// CSS class suffix for templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A single user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: Level,
    pub message: String,
}

impl Toast {
    /// Create a success toast.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    /// Create an error toast.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// In-memory toast buffer for the span of one request handler.
///
/// Collecting into a buffer keeps the aggregator and mutation executor free
/// of session I/O, which also makes them unit-testable without a store.
#[derive(Debug, Default)]
pub struct Notices {
    toasts: Vec<Toast>,
}

impl Notices {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { toasts: Vec::new() }
    }

    /// Queue a success toast.
    pub fn success(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::success(message));
    }

    /// Queue an error toast.
    pub fn error(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::error(message));
    }

    /// Number of queued toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Queued toasts, in push order.
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Append the buffered toasts to the session queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn flush(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        if self.toasts.is_empty() {
            return Ok(());
        }
        let mut pending: Vec<Toast> = session.get(TOASTS_KEY).await?.unwrap_or_default();
        pending.extend(self.toasts);
        session.insert(TOASTS_KEY, pending).await
    }
}

/// Drain all pending toasts from the session for rendering.
///
/// Returns an empty list on session errors; losing a toast is preferable to
/// failing the page it would have decorated.
pub async fn take(session: &Session) -> Vec<Toast> {
    session
        .remove::<Vec<Toast>>(TOASTS_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_collects_in_order() {
        let mut notices = Notices::new();
        notices.error("first");
        notices.success("second");

        assert_eq!(notices.len(), 2);
        assert_eq!(notices.toasts()[0], Toast::error("first"));
        assert_eq!(notices.toasts()[1], Toast::success("second"));
    }

    #[test]
    fn test_level_css_suffix() {
        assert_eq!(Level::Success.as_str(), "success");
        assert_eq!(Level::Error.as_str(), "error");
    }
}
