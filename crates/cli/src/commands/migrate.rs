//! Database migration command.
//!
//! Applies the embedded migrations from `crates/web/migrations/` to the
//! database named by `RECETARIO_DATABASE_URL` (or `DATABASE_URL`).

use tracing::info;

use recetario_web::db;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the environment is missing the database URL, the
/// connection fails, or a migration fails to apply.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
