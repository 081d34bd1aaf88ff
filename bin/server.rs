// KisanLog - Web Server
// JSON API under /api, optional static frontend for everything else

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use kisanlog::api::{self, AppState};
use kisanlog::logging::init_logger;
use kisanlog::{open_database, purge_expired_sessions, table_counts, ServerConfig};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_logger(config.verbose, config.log_json);
    config.validate()?;

    // Open database
    let conn = open_database(&config.db_path)?;
    let purged = purge_expired_sessions(&conn)?;
    let counts = table_counts(&conn)?;
    tracing::info!(
        path = %config.db_path.display(),
        users = counts.users,
        expenses = counts.expenses,
        yields = counts.yields,
        purged_sessions = purged,
        "database ready"
    );

    let state = AppState::new(conn, config.session_ttl(), config.secure_cookies);

    // Cookies travel cross-origin only to the one configured frontend
    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("invalid CORS origin '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = api::router(state);

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "serving frontend");
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, "KisanLog server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
