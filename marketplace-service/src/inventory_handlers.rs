use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::{ApiError, ApiResult};
use common_pagination::{PageInfo, Pagination};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::sql::{bind_query, bind_query_as, bind_query_scalar, ArgList, SqlArg};
use crate::AppState;

pub const CONDITIONS: &[&str] = &["new", "used", "refurbished"];

#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilters {
    pub business_id: Option<i64>,
    pub part_id: Option<i64>,
    pub condition: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub in_stock: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub business_id: i64,
    pub part_id: i64,
    pub part_title: String,
    pub part_sku: String,
    pub part_image: Option<String>,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub condition: String,
    pub shipping_cost: Option<BigDecimal>,
    pub minimum_days: Option<i32>,
    pub maximum_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const INVENTORY_COLUMNS: &str = "i.id, i.business_id, i.part_id, p.title AS part_title, p.sku AS part_sku, \
     p.image_url AS part_image, i.price, i.sale_price, i.quantity, i.condition, \
     i.shipping_cost, i.minimum_days, i.maximum_days, i.created_at, i.updated_at";

fn list_predicate(filters: &InventoryFilters) -> (Vec<String>, ArgList) {
    let mut conditions = Vec::new();
    let mut args = ArgList::new();

    if let Some(business_id) = filters.business_id {
        let ph = args.push(SqlArg::Int(business_id));
        conditions.push(format!("i.business_id = {ph}"));
    }
    if let Some(part_id) = filters.part_id {
        let ph = args.push(SqlArg::Int(part_id));
        conditions.push(format!("i.part_id = {ph}"));
    }
    if let Some(condition) = filters.condition.as_deref().filter(|s| !s.trim().is_empty()) {
        let ph = args.push(SqlArg::Text(condition.trim().to_string()));
        conditions.push(format!("i.condition = {ph}"));
    }
    if let Some(min) = &filters.min_price {
        let ph = args.push(SqlArg::Numeric(min.clone()));
        conditions.push(format!("i.price >= {ph}"));
    }
    if let Some(max) = &filters.max_price {
        let ph = args.push(SqlArg::Numeric(max.clone()));
        conditions.push(format!("i.price <= {ph}"));
    }
    if filters.in_stock.as_deref() == Some("true") {
        conditions.push("i.quantity > 0".to_string());
    }

    (conditions, args)
}

fn order_clause(sort: Option<&str>) -> &'static str {
    match sort {
        Some("price_asc") => "i.price ASC",
        Some("price_desc") => "i.price DESC",
        Some("newest") => "i.created_at DESC",
        _ => "i.id DESC",
    }
}

pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filters): Query<InventoryFilters>,
) -> ApiResult<Json<Value>> {
    let (conditions, mut args) = list_predicate(&filters);
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM inventory i{where_clause}");
    let total: i64 = bind_query_scalar(sqlx::query_scalar(&count_sql), args.as_slice())
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    let pg = Pagination::from_raw(filters.page.as_deref(), filters.limit.as_deref());
    let limit_ph = args.push(SqlArg::Int(pg.limit));
    let offset_ph = args.push(SqlArg::Int(pg.offset()));
    let page_sql = format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory i JOIN parts p ON i.part_id = p.id\
         {where_clause} ORDER BY {} LIMIT {limit_ph} OFFSET {offset_ph}",
        order_clause(filters.sort.as_deref()),
    );
    let rows: Vec<InventoryRow> = bind_query_as(sqlx::query_as(&page_sql), args.as_slice())
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "inventory": rows,
            "pagination": PageInfo::new(total, &pg),
        }
    })))
}

pub async fn get_inventory(
    State(state): State<AppState>,
    Path(inventory_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let row = sqlx::query_as::<_, InventoryRow>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory i JOIN parts p ON i.part_id = p.id WHERE i.id = $1"
    ))
    .bind(inventory_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::datastore)?
    .ok_or(ApiError::NotFound { code: "inventory_not_found" })?;

    Ok(Json(json!({ "success": true, "data": row })))
}

#[derive(Debug, Deserialize)]
pub struct NewInventory {
    pub business_id: i64,
    pub part_id: i64,
    pub price: BigDecimal,
    #[serde(default)]
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub condition: String,
    #[serde(default)]
    pub shipping_cost: Option<BigDecimal>,
    #[serde(default)]
    pub minimum_days: Option<i32>,
    #[serde(default)]
    pub maximum_days: Option<i32>,
}

pub async fn add_inventory(
    State(state): State<AppState>,
    Json(req): Json<NewInventory>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if !CONDITIONS.contains(&req.condition.as_str()) {
        return Err(ApiError::validation_msg(
            "invalid_condition",
            "Invalid condition value. Must be: new, used, or refurbished",
        ));
    }
    if req.price <= BigDecimal::from(0) {
        return Err(ApiError::validation_msg(
            "invalid_price",
            "Price must be greater than zero",
        ));
    }
    if req.quantity < 0 {
        return Err(ApiError::validation_msg(
            "invalid_quantity",
            "Quantity cannot be negative",
        ));
    }

    let part_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM parts WHERE id = $1")
        .bind(req.part_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if part_exists.is_none() {
        return Err(ApiError::NotFound { code: "part_not_found" });
    }

    // One offer per (business, part, condition); edits go through PUT.
    let duplicate: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM inventory WHERE business_id = $1 AND part_id = $2 AND condition = $3",
    )
    .bind(req.business_id)
    .bind(req.part_id)
    .bind(&req.condition)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::datastore)?;
    if duplicate.is_some() {
        return Err(ApiError::validation_msg(
            "duplicate_offer",
            "Inventory for this part, condition, and business already exists. Please update existing inventory instead.",
        ));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO inventory (business_id, part_id, price, sale_price, quantity, condition, \
                                shipping_cost, minimum_days, maximum_days) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
    )
    .bind(req.business_id)
    .bind(req.part_id)
    .bind(&req.price)
    .bind(&req.sale_price)
    .bind(req.quantity)
    .bind(&req.condition)
    .bind(&req.shipping_cost)
    .bind(req.minimum_days)
    .bind(req.maximum_days)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "id": id } })),
    ))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateInventory {
    pub price: Option<BigDecimal>,
    pub sale_price: Option<BigDecimal>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub shipping_cost: Option<BigDecimal>,
    pub minimum_days: Option<i32>,
    pub maximum_days: Option<i32>,
}

pub async fn update_inventory(
    State(state): State<AppState>,
    Path(inventory_id): Path<i64>,
    Json(req): Json<UpdateInventory>,
) -> ApiResult<Json<Value>> {
    let mut updates: Vec<String> = Vec::new();
    let mut args = ArgList::new();

    if let Some(price) = &req.price {
        if *price <= BigDecimal::from(0) {
            return Err(ApiError::validation_msg(
                "invalid_price",
                "Price must be greater than zero",
            ));
        }
        let ph = args.push(SqlArg::Numeric(price.clone()));
        updates.push(format!("price = {ph}"));
    }
    if let Some(sale_price) = &req.sale_price {
        let ph = args.push(SqlArg::Numeric(sale_price.clone()));
        updates.push(format!("sale_price = {ph}"));
    }
    if let Some(quantity) = req.quantity {
        if quantity < 0 {
            return Err(ApiError::validation_msg(
                "invalid_quantity",
                "Quantity cannot be negative",
            ));
        }
        let ph = args.push(SqlArg::Int4(quantity));
        updates.push(format!("quantity = {ph}"));
    }
    if let Some(condition) = &req.condition {
        if !CONDITIONS.contains(&condition.as_str()) {
            return Err(ApiError::validation_msg(
                "invalid_condition",
                "Invalid condition value. Must be: new, used, or refurbished",
            ));
        }
        let ph = args.push(SqlArg::Text(condition.clone()));
        updates.push(format!("condition = {ph}"));
    }
    if let Some(shipping_cost) = &req.shipping_cost {
        let ph = args.push(SqlArg::Numeric(shipping_cost.clone()));
        updates.push(format!("shipping_cost = {ph}"));
    }
    if let Some(minimum_days) = req.minimum_days {
        let ph = args.push(SqlArg::Int4(minimum_days));
        updates.push(format!("minimum_days = {ph}"));
    }
    if let Some(maximum_days) = req.maximum_days {
        let ph = args.push(SqlArg::Int4(maximum_days));
        updates.push(format!("maximum_days = {ph}"));
    }

    if updates.is_empty() {
        return Err(ApiError::validation_msg("no_fields", "No fields to update"));
    }
    updates.push("updated_at = NOW()".to_string());

    let id_ph = args.push(SqlArg::Int(inventory_id));
    let sql = format!("UPDATE inventory SET {} WHERE id = {id_ph}", updates.join(", "));
    let result = bind_query(sqlx::query(&sql), args.as_slice())
        .execute(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound { code: "inventory_not_found" });
    }

    Ok(Json(json!({
        "success": true,
        "data": { "id": inventory_id, "message": "Inventory updated successfully" }
    })))
}

pub async fn remove_inventory(
    State(state): State<AppState>,
    Path(inventory_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM inventory WHERE id = $1")
        .bind(inventory_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::datastore)?;
    if exists.is_none() {
        return Err(ApiError::NotFound { code: "inventory_not_found" });
    }

    // Order lines reference offers by id; deleting one would orphan history.
    let referenced: Option<i64> =
        sqlx::query_scalar("SELECT id FROM order_items WHERE inventory_id = $1 LIMIT 1")
            .bind(inventory_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::datastore)?;
    if referenced.is_some() {
        return Err(ApiError::validation_msg(
            "inventory_in_use",
            "Cannot delete inventory item that is associated with orders",
        ));
    }

    sqlx::query("DELETE FROM inventory WHERE id = $1")
        .bind(inventory_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Inventory item deleted successfully" }
    })))
}
