// /api/expenses - a farmer's expense ledger

use super::auth::CurrentUser;
use super::response::{json_body, ApiResponse};
use super::AppState;
use crate::entities::expense::{create_expense, delete_expense, list_expenses, update_expense};
use crate::entities::Expense;
use crate::error::Result;
use crate::schema::{ExpenseDraft, ExpensePatch};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

/// GET /api/expenses - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Expense>>>> {
    let conn = state.conn()?;
    let expenses = list_expenses(&conn, current.id())?;
    Ok(Json(ApiResponse::list(expenses)))
}

/// POST /api/expenses
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: std::result::Result<Json<ExpenseDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>)> {
    let draft = json_body(payload)?;
    let conn = state.conn()?;
    let expense = create_expense(&conn, current.id(), &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// PUT /api/expenses/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ExpensePatch>, JsonRejection>,
) -> Result<Json<ApiResponse<Expense>>> {
    let patch = json_body(payload)?;
    let conn = state.conn()?;
    let expense = update_expense(&conn, current.id(), &id, &patch)?;
    Ok(Json(ApiResponse::ok(expense)))
}

/// DELETE /api/expenses/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let conn = state.conn()?;
    delete_expense(&conn, current.id(), &id)?;
    Ok(Json(ApiResponse::message("Expense deleted successfully")))
}
