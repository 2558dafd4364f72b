//! Application services.
//!
//! Services sit between route handlers and the repositories in
//! [`crate::db`]: they own the business rules (credential checks, input
//! validation, session writes) while repositories own the SQL. Handlers
//! construct them per-request from the shared pool.

pub mod auth;

pub use auth::{AuthError, AuthService};
