// KisanLog - REST API with Axum
//
// Every route lives under `/api`. Record and analysis routes sit behind the
// session middleware; health and the login/register/logout trio do not.

pub mod analysis;
pub mod auth;
pub mod expenses;
pub mod response;
pub mod yields;

use crate::error::{AppError, Result};
use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

pub use auth::CurrentUser;
pub use response::ApiResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    pub session_ttl: chrono::Duration,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(conn: Connection, session_ttl: chrono::Duration, secure_cookies: bool) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            session_ttl,
            secure_cookies,
        }
    }

    /// Lock the connection for the duration of one handler's work.
    /// Never hold the guard across an `.await`.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

async fn api_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Build the `/api` router. The server binary adds CORS, tracing and static
/// files on top.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route("/expenses/:id", put(expenses::update).delete(expenses::remove))
        .route("/yields", get(yields::list).post(yields::create))
        .route("/yields/:id", put(yields::update).delete(yields::remove))
        .route("/analysis", get(analysis::crops))
        .route("/analysis/summary", get(analysis::summary))
        .route("/reports/csv", get(analysis::csv_report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout));

    let api = public.merge(protected).fallback(api_not_found);

    Router::new().nest("/api", api).with_state(state)
}
