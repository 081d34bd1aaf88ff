// 🔐 Sessions
//
// A session token is an opaque random string handed to the browser in a
// cookie. The database only keeps its SHA-256 digest, so a leaked database
// does not leak live sessions.

use crate::entities::user::{find_user_by_id, User};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Freshly issued session. `token` is the only copy of the raw secret.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_token() -> String {
    // 244 random bits
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

pub fn issue_session(conn: &Connection, user_id: &str, ttl: Duration) -> Result<SessionToken> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now + ttl;

    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![hash_token(&token), user_id, now, expires_at],
    )?;

    Ok(SessionToken {
        token,
        user_id: user_id.to_string(),
        expires_at,
    })
}

/// Resolve a cookie token to its user
pub fn validate_session(conn: &Connection, token: &str) -> Result<User> {
    validate_session_at(conn, token, Utc::now())
}

pub(crate) fn validate_session_at(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User> {
    let token_hash = hash_token(token);

    let session: Option<(String, DateTime<Utc>)> = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?1",
            [&token_hash],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (user_id, expires_at) = session.ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    if expires_at <= now {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [&token_hash])?;
        return Err(AppError::unauthorized("Token expired"));
    }

    find_user_by_id(conn, &user_id)?.ok_or_else(|| AppError::unauthorized("User no longer exists"))
}

/// Forget a session. Unknown tokens are ignored.
pub fn revoke_session(conn: &Connection, token: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        [hash_token(token)],
    )?;
    Ok(removed > 0)
}

/// Drop every expired session, returning how many were removed
pub fn purge_expired_sessions(conn: &Connection) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![Utc::now()],
    )?;
    Ok(removed)
}
