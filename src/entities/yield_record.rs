// 🌾 Yield records
// One row per harvest sale. `total_revenue` is derived and rewritten on every
// insert and update, so at rest it always equals quantity * price_per_unit.

use super::{ensure_owner, new_id, Season};
use crate::error::{AppError, Result};
use crate::schema::{
    validate_yield_draft, validate_yield_patch, YieldDraft, YieldPatch, TOTAL_REVENUE_TOO_LARGE,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldRecord {
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub date: NaiveDate,
    pub crop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    pub quantity: f64,
    /// Free text: "kg", "quintal", "tonne"...
    pub unit: String,
    pub price_per_unit: f64,
    pub total_revenue: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl YieldRecord {
    pub fn recompute_revenue(&mut self) {
        self.total_revenue = self.quantity * self.price_per_unit;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewYield {
    pub date: NaiveDate,
    pub crop: String,
    pub season: Option<Season>,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
}

/// Validated partial update. `Some(None)` clears the season.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YieldChanges {
    pub date: Option<NaiveDate>,
    pub crop: Option<String>,
    pub season: Option<Option<Season>>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
}

impl YieldChanges {
    pub fn apply_to(self, record: &mut YieldRecord) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(crop) = self.crop {
            record.crop = crop;
        }
        if let Some(season) = self.season {
            record.season = season;
        }
        if let Some(quantity) = self.quantity {
            record.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            record.unit = unit;
        }
        if let Some(price) = self.price_per_unit {
            record.price_per_unit = price;
        }
        record.recompute_revenue();
    }
}

const YIELD_COLUMNS: &str = "id, user_id, date, crop, season, quantity, unit, price_per_unit, \
                             total_revenue, created_at, updated_at";

fn yield_from_row(row: &Row<'_>) -> rusqlite::Result<YieldRecord> {
    Ok(YieldRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        crop: row.get(3)?,
        season: row.get(4)?,
        quantity: row.get(5)?,
        unit: row.get(6)?,
        price_per_unit: row.get(7)?,
        total_revenue: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// All yields of one user, most recent first
pub fn list_yields(conn: &Connection, user_id: &str) -> Result<Vec<YieldRecord>> {
    let sql = format!(
        "SELECT {} FROM yields WHERE user_id = ?1 ORDER BY date DESC, created_at DESC",
        YIELD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let yields = stmt
        .query_map([user_id], yield_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(yields)
}

pub fn find_yield(conn: &Connection, id: &str) -> Result<Option<YieldRecord>> {
    let sql = format!("SELECT {} FROM yields WHERE id = ?1", YIELD_COLUMNS);
    Ok(conn.query_row(&sql, [id], yield_from_row).optional()?)
}

pub fn insert_yield(conn: &Connection, user_id: &str, new: NewYield) -> Result<YieldRecord> {
    let now = Utc::now();
    let mut record = YieldRecord {
        id: new_id(),
        user_id: user_id.to_string(),
        date: new.date,
        crop: new.crop,
        season: new.season,
        quantity: new.quantity,
        unit: new.unit,
        price_per_unit: new.price_per_unit,
        total_revenue: 0.0,
        created_at: now,
        updated_at: now,
    };
    record.recompute_revenue();

    conn.execute(
        "INSERT INTO yields (
            id, user_id, date, crop, season, quantity, unit, price_per_unit,
            total_revenue, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.id,
            record.user_id,
            record.date,
            record.crop,
            record.season,
            record.quantity,
            record.unit,
            record.price_per_unit,
            record.total_revenue,
            record.created_at,
            record.updated_at,
        ],
    )?;

    Ok(record)
}

pub fn create_yield(conn: &Connection, user_id: &str, draft: &YieldDraft) -> Result<YieldRecord> {
    let new = validate_yield_draft(draft)?;
    let record = insert_yield(conn, user_id, new)?;
    tracing::info!(yield_id = %record.id, user_id, "yield record created");
    Ok(record)
}

pub fn update_yield(
    conn: &Connection,
    user_id: &str,
    id: &str,
    patch: &YieldPatch,
) -> Result<YieldRecord> {
    let mut record =
        find_yield(conn, id)?.ok_or_else(|| AppError::not_found("Yield record not found"))?;
    ensure_owner(&record.user_id, user_id, "Not authorized to update this yield record")?;

    let changes = validate_yield_patch(patch)?;
    changes.apply_to(&mut record);
    // One side may be new, the other stored
    if !record.total_revenue.is_finite() {
        return Err(AppError::validation(TOTAL_REVENUE_TOO_LARGE));
    }
    record.updated_at = Utc::now();

    conn.execute(
        "UPDATE yields
         SET date = ?1, crop = ?2, season = ?3, quantity = ?4, unit = ?5,
             price_per_unit = ?6, total_revenue = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            record.date,
            record.crop,
            record.season,
            record.quantity,
            record.unit,
            record.price_per_unit,
            record.total_revenue,
            record.updated_at,
            record.id,
        ],
    )?;

    tracing::info!(yield_id = %record.id, user_id, "yield record updated");
    Ok(record)
}

pub fn delete_yield(conn: &Connection, user_id: &str, id: &str) -> Result<()> {
    let record =
        find_yield(conn, id)?.ok_or_else(|| AppError::not_found("Yield record not found"))?;
    ensure_owner(&record.user_id, user_id, "Not authorized to delete this yield record")?;

    conn.execute("DELETE FROM yields WHERE id = ?1", [id])?;

    tracing::info!(yield_id = %id, user_id, "yield record deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        for id in ["farmer-a", "farmer-b"] {
            conn.execute(
                "INSERT INTO users (id, full_name, email, password_hash, created_at)
                 VALUES (?1, ?1, ?1 || '@example.com', 'x', '2025-01-01T00:00:00Z')",
                [id],
            )
            .unwrap();
        }
        conn
    }

    fn paddy(quantity: f64, price: f64) -> YieldDraft {
        YieldDraft {
            date: Some("2025-11-05".to_string()),
            crop: Some("Paddy".to_string()),
            season: Some("Kharif".to_string()),
            quantity: Some(quantity),
            unit: Some("quintal".to_string()),
            price_per_unit: Some(price),
        }
    }

    #[test]
    fn test_create_computes_total_revenue() {
        let conn = test_conn();
        let record = create_yield(&conn, "farmer-a", &paddy(10.0, 25.0)).unwrap();

        assert_eq!(record.total_revenue, 250.0);

        let stored = find_yield(&conn, &record.id).unwrap().unwrap();
        assert_eq!(stored.total_revenue, 250.0);
    }

    #[test]
    fn test_update_quantity_recomputes_revenue() {
        let conn = test_conn();
        let record = create_yield(&conn, "farmer-a", &paddy(10.0, 25.0)).unwrap();

        let patch = YieldPatch {
            quantity: Some(Some(5.0)),
            ..Default::default()
        };
        let updated = update_yield(&conn, "farmer-a", &record.id, &patch).unwrap();
        assert_eq!(updated.total_revenue, 125.0);

        let patch = YieldPatch {
            price_per_unit: Some(Some(30.0)),
            ..Default::default()
        };
        let updated = update_yield(&conn, "farmer-a", &record.id, &patch).unwrap();
        assert_eq!(updated.total_revenue, 150.0);

        let stored = find_yield(&conn, &record.id).unwrap().unwrap();
        assert_eq!(stored.total_revenue, stored.quantity * stored.price_per_unit);
    }

    #[test]
    fn test_update_rejects_overflowing_revenue() {
        let conn = test_conn();
        let record = create_yield(&conn, "farmer-a", &paddy(1e200, 1.0)).unwrap();

        let patch = YieldPatch {
            price_per_unit: Some(Some(1e200)),
            ..Default::default()
        };
        let err = update_yield(&conn, "farmer-a", &record.id, &patch).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), TOTAL_REVENUE_TOO_LARGE);

        let stored = find_yield(&conn, &record.id).unwrap().unwrap();
        assert_eq!(stored.total_revenue, 1e200);
    }

    #[test]
    fn test_update_clears_season() {
        let conn = test_conn();
        let record = create_yield(&conn, "farmer-a", &paddy(10.0, 25.0)).unwrap();

        let patch = YieldPatch {
            season: Some(String::new()),
            ..Default::default()
        };
        let updated = update_yield(&conn, "farmer-a", &record.id, &patch).unwrap();
        assert_eq!(updated.season, None);
    }

    #[test]
    fn test_ownership_enforced() {
        let conn = test_conn();
        let record = create_yield(&conn, "farmer-a", &paddy(10.0, 25.0)).unwrap();

        let err = update_yield(&conn, "farmer-b", &record.id, &YieldPatch::default()).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.to_string(), "Not authorized to update this yield record");

        let err = delete_yield(&conn, "farmer-b", &record.id).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(list_yields(&conn, "farmer-a").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_yield_is_not_found() {
        let conn = test_conn();
        let err = delete_yield(&conn, "farmer-a", "nope").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Yield record not found");
    }

    #[test]
    fn test_list_scoped_to_owner() {
        let conn = test_conn();
        create_yield(&conn, "farmer-a", &paddy(10.0, 25.0)).unwrap();
        create_yield(&conn, "farmer-b", &paddy(3.0, 20.0)).unwrap();

        let yields = list_yields(&conn, "farmer-b").unwrap();
        assert_eq!(yields.len(), 1);
        assert_eq!(yields[0].total_revenue, 60.0);
    }
}
