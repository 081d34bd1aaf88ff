// KisanLog - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod analysis;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod report;
pub mod schema;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use analysis::{
    crop_analysis, crop_key, expenses_by_category, expenses_by_month, farm_summary,
    CategoryTotal, CropAnalysisRow, CropEntry, FarmSummary, MonthlyTotal, UNKNOWN_CROP,
};
pub use auth::{
    issue_session, purge_expired_sessions, revoke_session, validate_session, SessionToken,
    SESSION_COOKIE,
};
pub use config::ServerConfig;
pub use db::{open_database, setup_database, table_counts, TableCounts};
pub use entities::{
    Expense, ExpenseCategory, NewExpense, NewYield, Registration, Season, User, YieldRecord,
};
pub use error::{AppError, Result};
pub use report::{csv_report_string, render_analysis_table, report_filename, write_csv_report};
pub use schema::{ExpenseDraft, ExpensePatch, ValidationError, YieldDraft, YieldPatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
