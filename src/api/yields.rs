// /api/yields - harvests and the revenue they brought in

use super::auth::CurrentUser;
use super::response::{json_body, ApiResponse};
use super::AppState;
use crate::entities::yield_record::{create_yield, delete_yield, list_yields, update_yield};
use crate::entities::YieldRecord;
use crate::error::Result;
use crate::schema::{YieldDraft, YieldPatch};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

/// GET /api/yields - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<YieldRecord>>>> {
    let conn = state.conn()?;
    let yields = list_yields(&conn, current.id())?;
    Ok(Json(ApiResponse::list(yields)))
}

/// POST /api/yields
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: std::result::Result<Json<YieldDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<YieldRecord>>)> {
    let draft = json_body(payload)?;
    let conn = state.conn()?;
    let record = create_yield(&conn, current.id(), &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// PUT /api/yields/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<YieldPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<YieldRecord>>> {
    let patch = json_body(payload)?;
    let conn = state.conn()?;
    let record = update_yield(&conn, current.id(), &id, &patch)?;
    Ok(Json(ApiResponse::ok(record)))
}

/// DELETE /api/yields/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let conn = state.conn()?;
    delete_yield(&conn, current.id(), &id)?;
    Ok(Json(ApiResponse::message("Yield record deleted successfully")))
}
