// 💸 Expense records
// One row per spend on a crop: seeds, labour, fuel and so on.

use super::{ensure_owner, new_id, ExpenseCategory, Season};
use crate::error::{AppError, Result};
use crate::schema::{validate_expense_draft, validate_expense_patch, ExpenseDraft, ExpensePatch};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    /// Owner reference
    #[serde(rename = "user")]
    pub user_id: String,
    pub date: NaiveDate,
    pub crop: String,
    pub category: ExpenseCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub crop: String,
    pub category: ExpenseCategory,
    pub season: Option<Season>,
    pub description: Option<String>,
    pub amount: f64,
}

/// Validated partial update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    pub date: Option<NaiveDate>,
    pub crop: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub season: Option<Option<Season>>,
    pub description: Option<Option<String>>,
    pub amount: Option<f64>,
}

impl ExpenseChanges {
    pub fn apply_to(self, expense: &mut Expense) {
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(crop) = self.crop {
            expense.crop = crop;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(season) = self.season {
            expense.season = season;
        }
        if let Some(description) = self.description {
            expense.description = description;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
    }
}

const EXPENSE_COLUMNS: &str =
    "id, user_id, date, crop, category, season, description, amount, created_at, updated_at";

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        crop: row.get(3)?,
        category: row.get(4)?,
        season: row.get(5)?,
        description: row.get(6)?,
        amount: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// All expenses of one user, most recent first
pub fn list_expenses(conn: &Connection, user_id: &str) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE user_id = ?1 ORDER BY date DESC, created_at DESC",
        EXPENSE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let expenses = stmt
        .query_map([user_id], expense_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(expenses)
}

pub fn find_expense(conn: &Connection, id: &str) -> Result<Option<Expense>> {
    let sql = format!("SELECT {} FROM expenses WHERE id = ?1", EXPENSE_COLUMNS);
    Ok(conn.query_row(&sql, [id], expense_from_row).optional()?)
}

pub fn insert_expense(conn: &Connection, user_id: &str, new: NewExpense) -> Result<Expense> {
    let now = Utc::now();
    let expense = Expense {
        id: new_id(),
        user_id: user_id.to_string(),
        date: new.date,
        crop: new.crop,
        category: new.category,
        season: new.season,
        description: new.description,
        amount: new.amount,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO expenses (
            id, user_id, date, crop, category, season, description, amount, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            expense.id,
            expense.user_id,
            expense.date,
            expense.crop,
            expense.category,
            expense.season,
            expense.description,
            expense.amount,
            expense.created_at,
            expense.updated_at,
        ],
    )?;

    Ok(expense)
}

pub fn create_expense(conn: &Connection, user_id: &str, draft: &ExpenseDraft) -> Result<Expense> {
    let new = validate_expense_draft(draft)?;
    let expense = insert_expense(conn, user_id, new)?;
    tracing::info!(expense_id = %expense.id, user_id, "expense created");
    Ok(expense)
}

/// Existence is checked before ownership, ownership before validation
pub fn update_expense(
    conn: &Connection,
    user_id: &str,
    id: &str,
    patch: &ExpensePatch,
) -> Result<Expense> {
    let mut expense =
        find_expense(conn, id)?.ok_or_else(|| AppError::not_found("Expense not found"))?;
    ensure_owner(&expense.user_id, user_id, "Not authorized to update this expense")?;

    let changes = validate_expense_patch(patch)?;
    changes.apply_to(&mut expense);
    expense.updated_at = Utc::now();

    conn.execute(
        "UPDATE expenses
         SET date = ?1, crop = ?2, category = ?3, season = ?4, description = ?5,
             amount = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            expense.date,
            expense.crop,
            expense.category,
            expense.season,
            expense.description,
            expense.amount,
            expense.updated_at,
            expense.id,
        ],
    )?;

    tracing::info!(expense_id = %expense.id, user_id, "expense updated");
    Ok(expense)
}

pub fn delete_expense(conn: &Connection, user_id: &str, id: &str) -> Result<()> {
    let expense =
        find_expense(conn, id)?.ok_or_else(|| AppError::not_found("Expense not found"))?;
    ensure_owner(&expense.user_id, user_id, "Not authorized to delete this expense")?;

    conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?;

    tracing::info!(expense_id = %id, user_id, "expense deleted");
    Ok(())
}
