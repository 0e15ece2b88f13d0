use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parts_count: i64,
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let categories = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, c.description, COUNT(p.id) AS parts_count \
         FROM part_categories c LEFT JOIN parts p ON p.category_id = c.id \
         GROUP BY c.id ORDER BY c.name ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok(Json(json!({ "success": true, "data": categories })))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let category = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, c.description, COUNT(p.id) AS parts_count \
         FROM part_categories c LEFT JOIN parts p ON p.category_id = c.id \
         WHERE c.id = $1 GROUP BY c.id",
    )
    .bind(category_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::datastore)?
    .ok_or(ApiError::NotFound { code: "category_not_found" })?;

    Ok(Json(json!({ "success": true, "data": category })))
}

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation_msg("missing_field", "name is required"));
    }

    let duplicate: Option<i64> =
        sqlx::query_scalar("SELECT id FROM part_categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::datastore)?;
    if duplicate.is_some() {
        return Err(ApiError::validation_msg(
            "category_exists",
            "Category with this name already exists",
        ));
    }

    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO part_categories (name, description) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(req.description.as_deref())
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "id": category_id } })),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Json(req): Json<CategoryInput>,
) -> ApiResult<Json<Value>> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation_msg("missing_field", "name is required"));
    }

    let updated = sqlx::query(
        "UPDATE part_categories SET name = $1, description = $2 WHERE id = $3",
    )
    .bind(name)
    .bind(req.description.as_deref())
    .bind(category_id)
    .execute(&state.db)
    .await
    .map_err(ApiError::datastore)?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::NotFound { code: "category_not_found" });
    }

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Category updated successfully" }
    })))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM part_categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if exists.is_none() {
        return Err(ApiError::NotFound { code: "category_not_found" });
    }

    let referenced: Option<i64> =
        sqlx::query_scalar("SELECT id FROM parts WHERE category_id = $1 LIMIT 1")
            .bind(category_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::datastore)?;
    if referenced.is_some() {
        return Err(ApiError::validation_msg(
            "category_in_use",
            "Cannot delete a category that still contains parts",
        ));
    }

    sqlx::query("DELETE FROM part_categories WHERE id = $1")
        .bind(category_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Category deleted successfully" }
    })))
}
