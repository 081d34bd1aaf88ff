// Session middleware and the /api/auth endpoints

use super::response::{json_body, ApiResponse, UserResponse};
use super::AppState;
use crate::auth::{issue_session, revoke_session, validate_session, SessionToken, SESSION_COOKIE};
use crate::entities::user::{authenticate, register_user, Credentials, Registration, User};
use crate::error::{AppError, Result};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// The authenticated caller, inserted by `require_auth`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

fn session_cookie(state: &AppState, session: &SessionToken) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .max_age(time::Duration::seconds(state.session_ttl.num_seconds()))
        .build()
}

fn authorize(state: &AppState, jar: &CookieJar) -> Result<CurrentUser> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Not authorized, no token provided"))?;

    let conn = state.conn()?;
    let user = validate_session(&conn, &token)?;
    Ok(CurrentUser { user, token })
}

/// Authentication middleware
///
/// Resolves the session cookie to a user and hands it to the handler as an
/// `Extension<CurrentUser>`. Anything else is a 401.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(&state, &jar) {
        Ok(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %request.uri().path(), reason = %err, "rejected unauthenticated request");
            err.into_response()
        }
    }
}

/// POST /api/auth/register - create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>)> {
    let registration = json_body(payload)?;

    let (user, session) = {
        let conn = state.conn()?;
        let user = register_user(&conn, &registration)?;
        let session = issue_session(&conn, &user.id, state.session_ttl)?;
        (user, session)
    };

    let jar = jar.add(session_cookie(&state, &session));
    Ok((StatusCode::CREATED, jar, Json(UserResponse::new(user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let credentials = json_body(payload)?;

    let (user, session) = {
        let conn = state.conn()?;
        let user = authenticate(&conn, &credentials.email, &credentials.password)
            .inspect_err(|_| tracing::warn!("failed login attempt"))?;
        let session = issue_session(&conn, &user.id, state.session_ttl)?;
        (user, session)
    };

    tracing::info!(user_id = %user.id, "user logged in");
    let jar = jar.add(session_cookie(&state, &session));
    Ok((jar, Json(UserResponse::new(user))))
}

/// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::new(current.user))
}

/// GET /api/auth/logout - revoke the session (if any) and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let conn = state.conn()?;
        revoke_session(&conn, cookie.value())?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(ApiResponse::message("Logged out successfully"))))
}
