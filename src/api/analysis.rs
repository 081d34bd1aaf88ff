// /api/analysis and /api/reports - read-only views over a user's records

use super::auth::CurrentUser;
use super::response::ApiResponse;
use super::AppState;
use crate::analysis::{
    crop_analysis, expenses_by_category, expenses_by_month, farm_summary, CategoryTotal,
    CropAnalysisRow, FarmSummary, MonthlyTotal,
};
use crate::entities::expense::list_expenses;
use crate::entities::yield_record::list_yields;
use crate::entities::{Expense, YieldRecord};
use crate::error::{AppError, Result};
use crate::report::{csv_report_string, report_filename};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;

/// Crop row as the dashboard charts it
#[derive(Debug, Serialize)]
pub struct CropRowView {
    pub crop: String,
    pub expenses: f64,
    pub revenue: f64,
    pub profit: f64,
    pub margin: f64,
}

impl From<CropAnalysisRow> for CropRowView {
    fn from(row: CropAnalysisRow) -> Self {
        let margin = row.margin_percent();
        Self {
            crop: row.crop,
            expenses: row.expenses,
            revenue: row.revenue,
            profit: row.profit,
            margin,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub summary: FarmSummary,
    pub by_category: Vec<CategoryTotal>,
    pub by_month: Vec<MonthlyTotal>,
}

fn load_records(state: &AppState, user_id: &str) -> Result<(Vec<Expense>, Vec<YieldRecord>)> {
    let conn = state.conn()?;
    Ok((list_expenses(&conn, user_id)?, list_yields(&conn, user_id)?))
}

/// GET /api/analysis - per-crop expenses, revenue and profit
pub async fn crops(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<CropRowView>>>> {
    let (expenses, yields) = load_records(&state, current.id())?;
    let rows = crop_analysis(&expenses, &yields)
        .into_iter()
        .map(CropRowView::from)
        .collect();
    Ok(Json(ApiResponse::list(rows)))
}

/// GET /api/analysis/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SummaryView>>> {
    let (expenses, yields) = load_records(&state, current.id())?;
    Ok(Json(ApiResponse::ok(SummaryView {
        summary: farm_summary(&expenses, &yields),
        by_category: expenses_by_category(&expenses),
        by_month: expenses_by_month(&expenses),
    })))
}

/// GET /api/reports/csv - download the full report
pub async fn csv_report(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let (expenses, yields) = load_records(&state, current.id())?;
    let now = Utc::now();
    let body = csv_report_string(&expenses, &yields, now).map_err(AppError::Internal)?;

    tracing::info!(
        user_id = %current.id(),
        expenses = expenses.len(),
        yields = yields.len(),
        "csv report generated"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report_filename(now.date_naive())),
            ),
        ],
        body,
    ))
}
