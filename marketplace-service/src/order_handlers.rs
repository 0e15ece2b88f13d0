use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::UserId;
use crate::money::{effective_unit_price, line_subtotal};
use crate::AppState;

pub const ORDER_STATUSES: &[&str] =
    &["pending", "processing", "shipped", "delivered", "cancelled"];

#[derive(Debug, Deserialize)]
pub struct OrderLine {
    pub inventory_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: BigDecimal,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order line with the display columns the storefront needs alongside the
/// snapshot. `price`/`subtotal` come from order_items, never live inventory.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub inventory_id: i64,
    pub quantity: i32,
    pub price: BigDecimal,
    pub subtotal: BigDecimal,
    pub part_id: i64,
    pub condition: String,
    pub title: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub business_id: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

const ORDER_COLUMNS: &str = "id, user_id, total_amount, shipping_address, billing_address, \
     payment_method, payment_status, status, notes, created_at";

const ORDER_ITEM_SQL: &str = "SELECT oi.id, oi.order_id, oi.inventory_id, oi.quantity, oi.price, oi.subtotal, \
            i.part_id, i.condition, i.business_id, p.title, p.sku, p.image_url \
     FROM order_items oi \
     JOIN inventory i ON oi.inventory_id = i.id \
     JOIN parts p ON i.part_id = p.id \
     WHERE oi.order_id = $1";

/// Request-shape validation, performed before any datastore round trip.
pub fn validate_new_order(req: &NewOrder) -> Result<(), ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::validation_msg(
            "empty_order",
            "Order must contain at least one item",
        ));
    }
    for (field, value) in [
        ("shipping_address", &req.shipping_address),
        ("billing_address", &req.billing_address),
        ("payment_method", &req.payment_method),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::validation_msg(
                "missing_field",
                format!("Missing required field: {field}"),
            ));
        }
    }
    for line in &req.items {
        if line.quantity < 1 {
            return Err(ApiError::validation_msg(
                "invalid_quantity",
                format!(
                    "Quantity for inventory {} must be at least 1",
                    line.inventory_id
                ),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    price: BigDecimal,
    sale_price: Option<BigDecimal>,
    quantity: i32,
    title: String,
}

/// Create an order as a single all-or-nothing transaction: lock each
/// referenced inventory row, validate stock, snapshot the effective price,
/// decrement, then insert the order and its lines. Any failure drops the
/// transaction handle and rolls everything back.
pub async fn create_order(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_new_order(&req)?;

    let mut tx = state.db.begin().await.map_err(ApiError::datastore)?;

    let mut total = BigDecimal::from(0);
    let mut priced: Vec<(i64, i32, BigDecimal, BigDecimal)> = Vec::with_capacity(req.items.len());

    for line in &req.items {
        // Row lock before the stock check; a duplicate inventory id later in
        // the same request re-reads the quantity this transaction already
        // decremented.
        let offer = sqlx::query_as::<_, OfferRow>(
            "SELECT i.price, i.sale_price, i.quantity, p.title \
             FROM inventory i JOIN parts p ON i.part_id = p.id \
             WHERE i.id = $1 FOR UPDATE OF i",
        )
        .bind(line.inventory_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::datastore)?
        .ok_or(ApiError::NotFound { code: "inventory_not_found" })?;

        if offer.quantity < line.quantity {
            return Err(ApiError::InsufficientStock {
                part_title: offer.title,
                available: offer.quantity,
            });
        }

        let unit = effective_unit_price(&offer.price, offer.sale_price.as_ref());
        let subtotal = line_subtotal(&unit, line.quantity);
        total = total + &subtotal;

        // Conditional decrement as a second guard on top of the lock: a race
        // loss fails this request instead of driving stock negative.
        let updated = sqlx::query(
            "UPDATE inventory SET quantity = quantity - $1, updated_at = NOW() \
             WHERE id = $2 AND quantity >= $1",
        )
        .bind(line.quantity)
        .bind(line.inventory_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::datastore)?;
        if updated.rows_affected() == 0 {
            return Err(ApiError::Conflict { code: "stock_conflict" });
        }

        priced.push((line.inventory_id, line.quantity, unit, subtotal));
    }

    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, total_amount, shipping_address, billing_address, \
                             payment_method, payment_status, status, notes) \
         VALUES ($1, $2, $3, $4, $5, 'pending', 'pending', $6) RETURNING id",
    )
    .bind(user_id)
    .bind(&total)
    .bind(req.shipping_address.trim())
    .bind(req.billing_address.trim())
    .bind(req.payment_method.trim())
    .bind(req.notes.as_deref())
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::datastore)?;

    for (inventory_id, quantity, price, subtotal) in &priced {
        sqlx::query(
            "INSERT INTO order_items (order_id, inventory_id, quantity, price, subtotal) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(*inventory_id)
        .bind(*quantity)
        .bind(price)
        .bind(subtotal)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::datastore)?;
    }

    tx.commit().await.map_err(ApiError::datastore)?;

    tracing::info!(order_id, user_id, lines = priced.len(), total = %total, "order created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "id": order_id, "total_amount": total }
        })),
    ))
}

async fn order_items(db: &PgPool, order_id: i64) -> ApiResult<Vec<OrderItemRow>> {
    sqlx::query_as::<_, OrderItemRow>(ORDER_ITEM_SQL)
        .bind(order_id)
        .fetch_all(db)
        .await
        .map_err(ApiError::datastore)
}

pub async fn list_orders(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Value>> {
    let orders = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let items = order_items(&state.db, order.id).await?;
        out.push(OrderWithItems { order, items });
    }

    Ok(Json(json!({ "success": true, "data": out })))
}

pub async fn get_order(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(order_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::datastore)?
    .ok_or(ApiError::NotFound { code: "order_not_found" })?;

    if order.user_id != user_id {
        return Err(ApiError::Forbidden { code: "order_forbidden" });
    }

    let items = order_items(&state.db, order.id).await?;
    Ok(Json(json!({ "success": true, "data": OrderWithItems { order, items } })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

/// Owners may cancel (unless already shipped/delivered); a business that
/// supplies any line may move fulfilment status. Totals and line snapshots
/// are immutable, only `status` changes here.
async fn apply_status_change(
    db: &PgPool,
    user_id: i64,
    order_id: i64,
    new_status: &str,
) -> ApiResult<()> {
    if !ORDER_STATUSES.contains(&new_status) {
        return Err(ApiError::validation_msg(
            "invalid_status",
            format!("Invalid status. Must be: {}", ORDER_STATUSES.join(", ")),
        ));
    }

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(order_id)
    .fetch_optional(db)
    .await
    .map_err(ApiError::datastore)?
    .ok_or(ApiError::NotFound { code: "order_not_found" })?;

    let allowed = if order.user_id == user_id && new_status == "cancelled" {
        if matches!(order.status.as_str(), "shipped" | "delivered") {
            return Err(ApiError::validation_msg(
                "cannot_cancel",
                "Cannot cancel an order that has been shipped or delivered",
            ));
        }
        true
    } else {
        let suppliers: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT i.business_id FROM order_items oi \
             JOIN inventory i ON oi.inventory_id = i.id WHERE oi.order_id = $1",
        )
        .bind(order_id)
        .fetch_all(db)
        .await
        .map_err(ApiError::datastore)?;
        suppliers.contains(&user_id)
    };

    if !allowed {
        return Err(ApiError::Forbidden { code: "order_forbidden" });
    }

    sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(new_status)
        .bind(order_id)
        .execute(db)
        .await
        .map_err(ApiError::datastore)?;

    tracing::info!(order_id, user_id, status = new_status, "order status updated");
    Ok(())
}

pub async fn update_order_status(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(order_id): Path<i64>,
    Json(req): Json<UpdateOrderStatus>,
) -> ApiResult<Json<Value>> {
    apply_status_change(&state.db, user_id, order_id, req.status.trim()).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Order status updated successfully" }
    })))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    apply_status_change(&state.db, user_id, order_id, "cancelled").await?;
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Order cancelled" }
    })))
}
