//! HTTP API: Axum server for players and admins.
//!
//! Serves the public betting API, the token-guarded admin API and the
//! uploaded candidate photos. CORS enabled for a separately served
//! front end.

pub mod admin;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::ADMIN_TOKEN_HEADER;

pub use routes::{AppState, WebState};

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr, "Layoffs market listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(ADMIN_TOKEN_HEADER),
        ]);

    let admin_api = Router::new()
        .route("/dashboard", get(admin::get_dashboard))
        .route("/departments", post(admin::create_department))
        .route(
            "/departments/:id",
            put(admin::update_department).delete(admin::delete_department),
        )
        .route("/positions", post(admin::create_position))
        .route(
            "/positions/:id",
            put(admin::update_position).delete(admin::delete_position),
        )
        .route("/positions/:id/cuts", post(admin::update_cuts))
        .route("/candidates", post(admin::create_candidate))
        .route(
            "/candidates/:id",
            put(admin::update_candidate).delete(admin::delete_candidate),
        )
        .route("/candidates/:id/layoff", post(admin::set_layoff));

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/summary", get(routes::get_summary))
        .route("/api/departments", get(routes::get_departments))
        .route("/api/departments/:id", get(routes::get_department))
        .route("/api/candidates/:id", get(routes::get_candidate))
        .route("/api/register", post(routes::register))
        .route("/api/users/:id", get(routes::get_user))
        .route("/api/users/:id/profile", get(routes::get_profile))
        .route("/api/bet", post(routes::place_bet))
        .route("/api/leaderboard", get(routes::get_leaderboard))
        .nest("/api/admin", admin_api)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
