// ⚠️ Error taxonomy
// Every failure a request can hit maps onto exactly one HTTP status.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid input (400)
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Record exists but belongs to another user (403)
    #[error("{0}")]
    Forbidden(String),

    /// Record id does not exist (404)
    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => 500,
        }
    }

    /// Whether the message is safe to show to the client as-is.
    /// Storage and internal failures are replaced by a generic message.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Message surfaced in the `{success: false, message}` envelope
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
