//! Middleware: sessions, auth extractors and rate limiting.
//!
//! Layer order in the router, outermost first: Sentry capture, then the
//! session layer, then per-route-group governor limits. The auth extractors
//! read the session the layer below has already loaded.

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, safe_next_path};
pub use rate_limit::{auth_rate_limiter, mutation_rate_limiter};
pub use session::create_session_layer;
