// 👤 User accounts
// Passwords are stored as Argon2id PHC strings, never in plain text.

use crate::error::{AppError, Result};
use crate::schema::validate_registration;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const USER_COLUMNS: &str = "id, full_name, email, password_hash, created_at";

pub fn find_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
    Ok(conn
        .query_row(&sql, [normalize_email(email)], user_from_row)
        .optional()?)
}

/// Create a new account. Emails are unique, compared case-insensitively.
pub fn register_user(conn: &Connection, registration: &Registration) -> Result<User> {
    validate_registration(registration)?;

    let email = normalize_email(&registration.email);
    if find_user_by_email(conn, &email)?.is_some() {
        return Err(AppError::validation("User already exists"));
    }

    let user = User {
        id: super::new_id(),
        full_name: registration.full_name.trim().to_string(),
        email,
        password_hash: hash_password(&registration.password)?,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, full_name, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.full_name,
            user.email,
            user.password_hash,
            user.created_at
        ],
    )?;

    tracing::info!(user_id = %user.id, "registered new user");
    Ok(user)
}

/// Check an email/password pair. Both failure modes share one message.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<User> {
    let invalid = || AppError::unauthorized("Invalid credentials");

    let user = find_user_by_email(conn, email)?.ok_or_else(invalid)?;
    if verify_password(password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(invalid())
    }
}
