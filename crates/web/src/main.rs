//! Recetario - recipe sharing site.
//!
//! This binary serves the whole application: server-rendered pages with
//! HTMX fragments for the interactive controls, `PostgreSQL` for all data,
//! and local-filesystem media storage served under `/media`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recetario_web::config::SiteConfig;
use recetario_web::state::AppState;
use recetario_web::{db, middleware, routes};

/// Initialize Sentry and return the guard that must be kept alive for the
/// process lifetime. A missing DSN disables error tracking entirely.
fn init_sentry(config: &SiteConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry error tracking enabled");
    Some(guard)
}

/// Route tracing events into Sentry: warnings and errors become events,
/// informational levels become breadcrumbs on them.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recetario_web=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Assemble the full application router around `state`.
fn build_router(state: &AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/web/static"))
        .nest_service("/media", ServeDir::new(state.media().root()))
        .layer(session_layer)
        .with_state(state.clone())
        // Sentry layers sit outermost so every request is covered.
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Config first: Sentry and tracing both need it.
    let config = SiteConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("database connection failed");
    tracing::info!("connected to postgres");

    // Migrations are applied out of band:
    //   cargo run -p recetario-cli -- migrate

    let state = AppState::new(config, pool);
    state
        .media()
        .ensure_layout()
        .await
        .expect("Failed to create media directories");

    let app = build_router(&state);

    let addr = state.config().socket_addr();
    tracing::info!("recetario listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("could not bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server exited with an error");
}

/// Liveness probe: the process is up. Checks nothing else.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: 200 only when the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let probe: Result<i32, _> = sqlx::query_scalar("SELECT 1").fetch_one(state.pool()).await;
    if probe.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Resolve on Ctrl+C or SIGTERM, whichever lands first.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl+c handler failed to install");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler failed to install")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
