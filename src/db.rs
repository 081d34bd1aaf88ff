use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Ownership rows cascade away with their user
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Users & Sessions
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Only the SHA-256 digest of a token is stored; the raw token lives in the cookie
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Expenses
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            crop TEXT NOT NULL,
            category TEXT NOT NULL CHECK (category IN (
                'Seeds', 'Fertilizers', 'Pesticides', 'Labor',
                'Machinery', 'Fuel', 'Irrigation', 'Other'
            )),
            season TEXT CHECK (season IS NULL OR season IN ('Kharif', 'Rabi', 'Zaid')),
            description TEXT,
            amount REAL NOT NULL CHECK (amount >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Yields (total_revenue = quantity * price_per_unit, maintained on write)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS yields (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            crop TEXT NOT NULL,
            season TEXT CHECK (season IS NULL OR season IN ('Kharif', 'Rabi', 'Zaid')),
            quantity REAL NOT NULL CHECK (quantity >= 0),
            unit TEXT NOT NULL,
            price_per_unit REAL NOT NULL CHECK (price_per_unit >= 0),
            total_revenue REAL NOT NULL CHECK (total_revenue >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // Indexes for per-user, most-recent-first listing
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date DESC)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_yields_user_date ON yields(user_id, date DESC)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
        [],
    )?;

    Ok(())
}

/// Row counts per table, used by the CLI after `init`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub users: i64,
    pub sessions: i64,
    pub expenses: i64,
    pub yields: i64,
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    };

    Ok(TableCounts {
        users: count("users")?,
        sessions: count("sessions")?,
        expenses: count("expenses")?,
        yields: count("yields")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let counts = table_counts(&conn).unwrap();
        assert_eq!(counts, TableCounts::default());
    }

    #[test]
    fn test_check_constraints_reject_negative_amount() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (id, full_name, email, password_hash, created_at)
             VALUES ('u1', 'Ravi', 'ravi@example.com', 'x', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO expenses (id, user_id, date, crop, category, amount, created_at, updated_at)
             VALUES ('e1', 'u1', '2025-01-01', 'Wheat', 'Seeds', -5, 'now', 'now')",
            [],
        );
        assert!(result.is_err(), "negative amount must violate CHECK");

        let result = conn.execute(
            "INSERT INTO expenses (id, user_id, date, crop, category, amount, created_at, updated_at)
             VALUES ('e2', 'u1', '2025-01-01', 'Wheat', 'Snacks', 5, 'now', 'now')",
            [],
        );
        assert!(result.is_err(), "unknown category must violate CHECK");
    }

    #[test]
    fn test_open_database_on_disk_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.db");

        let conn = open_database(&path).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
    }
}
