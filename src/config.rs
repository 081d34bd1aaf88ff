// ⚙️ Server configuration
// Flags first, then environment variables, then defaults.

use crate::error::{AppError, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "kisanlog-server", version, about = "KisanLog farm bookkeeping API server")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "KISANLOG_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// SQLite database file
    #[arg(long, env = "KISANLOG_DB", default_value = "kisanlog.db")]
    pub db_path: PathBuf,

    /// Directory with the frontend assets, served for non-API paths
    #[arg(long, env = "KISANLOG_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Origin allowed to call the API with credentials
    #[arg(long, env = "KISANLOG_CORS_ORIGIN", default_value = "http://localhost:5000")]
    pub cors_origin: String,

    /// Lifetime of a login session
    #[arg(long, env = "KISANLOG_SESSION_TTL_HOURS", default_value_t = 24)]
    pub session_ttl_hours: u32,

    /// Mark the session cookie `Secure` (requires HTTPS)
    #[arg(long, env = "KISANLOG_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours == 0 {
            return Err(AppError::Config(
                "session TTL must be at least one hour".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|_| AppError::Config(format!("invalid bind address '{}'", self.bind)))
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }
}
