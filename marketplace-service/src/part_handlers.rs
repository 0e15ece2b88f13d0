use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::{ApiError, ApiResult};
use common_pagination::{PageInfo, Pagination};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::sql::{bind_query, bind_query_as, bind_query_scalar, ArgList, SqlArg};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PartFilters {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub manufacturer: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PartRow {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub title: String,
    pub description: Option<String>,
    pub sku: String,
    pub manufacturer: Option<String>,
    pub weight: Option<BigDecimal>,
    pub dimensions: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CompatibilityRow {
    pub id: i64,
    pub model_id: i64,
    pub model_name: String,
    pub make_name: String,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OfferSummaryRow {
    pub id: i64,
    pub business_id: i64,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub condition: String,
    pub shipping_cost: Option<BigDecimal>,
    pub minimum_days: Option<i32>,
    pub maximum_days: Option<i32>,
}

const PART_COLUMNS: &str = "p.id, p.category_id, cat.name AS category_name, p.title, p.description, \
     p.sku, p.manufacturer, p.weight, p.dimensions, p.image_url, p.created_at";

pub async fn list_parts(
    State(state): State<AppState>,
    Query(filters): Query<PartFilters>,
) -> ApiResult<Json<Value>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut args = ArgList::new();

    if let Some(category_id) = filters.category_id {
        let ph = args.push(SqlArg::Int(category_id));
        conditions.push(format!("p.category_id = {ph}"));
    }
    if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let ph = args.push(SqlArg::Text(format!("%{term}%")));
        conditions.push(format!(
            "(p.title ILIKE {ph} OR p.description ILIKE {ph} OR p.sku ILIKE {ph})"
        ));
    }
    if let Some(manufacturer) = filters.manufacturer.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let ph = args.push(SqlArg::Text(manufacturer.to_string()));
        conditions.push(format!("p.manufacturer = {ph}"));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM parts p{where_clause}");
    let total: i64 = bind_query_scalar(sqlx::query_scalar(&count_sql), args.as_slice())
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    let pg = Pagination::from_raw(filters.page.as_deref(), filters.limit.as_deref());
    let limit_ph = args.push(SqlArg::Int(pg.limit));
    let offset_ph = args.push(SqlArg::Int(pg.offset()));
    let page_sql = format!(
        "SELECT {PART_COLUMNS} FROM parts p JOIN part_categories cat ON p.category_id = cat.id\
         {where_clause} ORDER BY p.created_at DESC LIMIT {limit_ph} OFFSET {offset_ph}"
    );
    let parts: Vec<PartRow> = bind_query_as(sqlx::query_as(&page_sql), args.as_slice())
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "parts": parts,
            "pagination": PageInfo::new(total, &pg),
        }
    })))
}

pub async fn get_part(
    State(state): State<AppState>,
    Path(part_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let part = sqlx::query_as::<_, PartRow>(&format!(
        "SELECT {PART_COLUMNS} FROM parts p JOIN part_categories cat ON p.category_id = cat.id WHERE p.id = $1"
    ))
    .bind(part_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::datastore)?
    .ok_or(ApiError::NotFound { code: "part_not_found" })?;

    let compatibility = sqlx::query_as::<_, CompatibilityRow>(
        "SELECT pc.id, pc.model_id, cm.name AS model_name, mk.name AS make_name, \
                pc.year_from, pc.year_to, pc.notes \
         FROM part_compatibility pc \
         JOIN car_models cm ON pc.model_id = cm.id \
         JOIN car_makes mk ON cm.make_id = mk.id \
         WHERE pc.part_id = $1",
    )
    .bind(part_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    let inventory = sqlx::query_as::<_, OfferSummaryRow>(
        "SELECT id, business_id, price, sale_price, quantity, condition, \
                shipping_cost, minimum_days, maximum_days \
         FROM inventory WHERE part_id = $1 AND quantity > 0",
    )
    .bind(part_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "part": part,
            "compatibility": compatibility,
            "inventory": inventory,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct CompatibilityInput {
    pub model_id: i64,
    #[serde(default)]
    pub year_from: Option<i32>,
    #[serde(default)]
    pub year_to: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewPart {
    pub category_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub weight: Option<BigDecimal>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub compatibility: Vec<CompatibilityInput>,
}

async fn replace_compatibility(
    db: &PgPool,
    part_id: i64,
    rows: &[CompatibilityInput],
) -> ApiResult<()> {
    sqlx::query("DELETE FROM part_compatibility WHERE part_id = $1")
        .bind(part_id)
        .execute(db)
        .await
        .map_err(ApiError::datastore)?;
    for row in rows {
        sqlx::query(
            "INSERT INTO part_compatibility (part_id, model_id, year_from, year_to, notes) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(part_id)
        .bind(row.model_id)
        .bind(row.year_from)
        .bind(row.year_to)
        .bind(row.notes.as_deref())
        .execute(db)
        .await
        .map_err(ApiError::datastore)?;
    }
    Ok(())
}

pub async fn create_part(
    State(state): State<AppState>,
    Json(req): Json<NewPart>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if req.title.trim().is_empty() || req.sku.trim().is_empty() {
        return Err(ApiError::validation_msg(
            "missing_field",
            "title and sku are required",
        ));
    }

    let duplicate: Option<i64> = sqlx::query_scalar("SELECT id FROM parts WHERE sku = $1")
        .bind(req.sku.trim())
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if duplicate.is_some() {
        return Err(ApiError::validation_msg(
            "sku_exists",
            "Part with this SKU already exists",
        ));
    }

    let part_id: i64 = sqlx::query_scalar(
        "INSERT INTO parts (category_id, title, description, sku, manufacturer, weight, dimensions, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(req.category_id)
    .bind(req.title.trim())
    .bind(req.description.as_deref())
    .bind(req.sku.trim())
    .bind(req.manufacturer.as_deref())
    .bind(&req.weight)
    .bind(req.dimensions.as_deref())
    .bind(req.image_url.as_deref())
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    if !req.compatibility.is_empty() {
        replace_compatibility(&state.db, part_id, &req.compatibility).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "id": part_id } })),
    ))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePart {
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub manufacturer: Option<String>,
    pub weight: Option<BigDecimal>,
    pub dimensions: Option<String>,
    pub image_url: Option<String>,
    pub compatibility: Option<Vec<CompatibilityInput>>,
}

pub async fn update_part(
    State(state): State<AppState>,
    Path(part_id): Path<i64>,
    Json(req): Json<UpdatePart>,
) -> ApiResult<Json<Value>> {
    let mut updates: Vec<String> = Vec::new();
    let mut args = ArgList::new();

    if let Some(category_id) = req.category_id {
        let ph = args.push(SqlArg::Int(category_id));
        updates.push(format!("category_id = {ph}"));
    }
    if let Some(title) = req.title.as_deref().map(str::trim) {
        if title.is_empty() {
            return Err(ApiError::validation_msg(
                "missing_field",
                "title cannot be blank",
            ));
        }
        let ph = args.push(SqlArg::Text(title.to_string()));
        updates.push(format!("title = {ph}"));
    }
    if let Some(description) = req.description.as_deref() {
        let ph = args.push(SqlArg::Text(description.to_string()));
        updates.push(format!("description = {ph}"));
    }
    if let Some(sku) = req.sku.as_deref().map(str::trim) {
        if sku.is_empty() {
            return Err(ApiError::validation_msg(
                "missing_field",
                "sku cannot be blank",
            ));
        }
        let duplicate: Option<i64> =
            sqlx::query_scalar("SELECT id FROM parts WHERE sku = $1 AND id <> $2")
                .bind(sku)
                .bind(part_id)
                .fetch_optional(&state.db)
                .await
                .map_err(ApiError::datastore)?;
        if duplicate.is_some() {
            return Err(ApiError::validation_msg(
                "sku_exists",
                "Part with this SKU already exists",
            ));
        }
        let ph = args.push(SqlArg::Text(sku.to_string()));
        updates.push(format!("sku = {ph}"));
    }
    if let Some(manufacturer) = req.manufacturer.as_deref() {
        let ph = args.push(SqlArg::Text(manufacturer.to_string()));
        updates.push(format!("manufacturer = {ph}"));
    }
    if let Some(weight) = &req.weight {
        let ph = args.push(SqlArg::Numeric(weight.clone()));
        updates.push(format!("weight = {ph}"));
    }
    if let Some(dimensions) = req.dimensions.as_deref() {
        let ph = args.push(SqlArg::Text(dimensions.to_string()));
        updates.push(format!("dimensions = {ph}"));
    }
    if let Some(image_url) = req.image_url.as_deref() {
        let ph = args.push(SqlArg::Text(image_url.to_string()));
        updates.push(format!("image_url = {ph}"));
    }

    if updates.is_empty() && req.compatibility.is_none() {
        return Err(ApiError::validation_msg("no_fields", "No fields to update"));
    }

    if updates.is_empty() {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM parts WHERE id = $1")
            .bind(part_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::datastore)?;
        if exists.is_none() {
            return Err(ApiError::NotFound { code: "part_not_found" });
        }
    } else {
        let id_ph = args.push(SqlArg::Int(part_id));
        let sql = format!("UPDATE parts SET {} WHERE id = {id_ph}", updates.join(", "));
        let result = bind_query(sqlx::query(&sql), args.as_slice())
            .execute(&state.db)
            .await
            .map_err(ApiError::datastore)?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound { code: "part_not_found" });
        }
    }

    // Some(vec![]) clears the fitment list; None leaves it untouched.
    if let Some(rows) = &req.compatibility {
        replace_compatibility(&state.db, part_id, rows).await?;
    }

    Ok(Json(json!({
        "success": true,
        "data": { "id": part_id, "message": "Part updated successfully" }
    })))
}

pub async fn delete_part(
    State(state): State<AppState>,
    Path(part_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM parts WHERE id = $1")
        .bind(part_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if exists.is_none() {
        return Err(ApiError::NotFound { code: "part_not_found" });
    }

    let offered: Option<i64> =
        sqlx::query_scalar("SELECT id FROM inventory WHERE part_id = $1 LIMIT 1")
            .bind(part_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::datastore)?;
    if offered.is_some() {
        return Err(ApiError::validation_msg(
            "part_in_use",
            "Cannot delete a part that has inventory listed against it",
        ));
    }

    sqlx::query("DELETE FROM part_compatibility WHERE part_id = $1")
        .bind(part_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    sqlx::query("DELETE FROM parts WHERE id = $1")
        .bind(part_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Part deleted successfully" }
    })))
}
