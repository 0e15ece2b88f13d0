use axum::extract::{Path, State};
use axum::Json;
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CarMakeRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CarModelRow {
    pub id: i64,
    pub make_id: i64,
    pub name: String,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

pub async fn list_makes(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let makes =
        sqlx::query_as::<_, CarMakeRow>("SELECT id, name FROM car_makes ORDER BY name ASC")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::datastore)?;

    Ok(Json(json!({ "success": true, "data": makes })))
}

pub async fn list_models(
    State(state): State<AppState>,
    Path(make_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let make: Option<i64> = sqlx::query_scalar("SELECT id FROM car_makes WHERE id = $1")
        .bind(make_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if make.is_none() {
        return Err(ApiError::NotFound { code: "make_not_found" });
    }

    let models = sqlx::query_as::<_, CarModelRow>(
        "SELECT id, make_id, name, year_from, year_to \
         FROM car_models WHERE make_id = $1 ORDER BY name ASC",
    )
    .bind(make_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok(Json(json!({ "success": true, "data": models })))
}
