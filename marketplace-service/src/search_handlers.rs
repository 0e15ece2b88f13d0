use axum::extract::{Query, State};
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::{ApiError, ApiResult};
use common_pagination::PageInfo;
use serde::Serialize;
use serde_json::{json, Value};

use crate::search::{PartSearchQuery, SearchFilters};
use crate::sql::{bind_query_as, bind_query_scalar};
use crate::AppState;

/// One search hit: part columns plus the derived offer aggregates.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PartHit {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub title: String,
    pub description: Option<String>,
    pub sku: String,
    pub manufacturer: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub min_price: Option<BigDecimal>,
    pub suppliers_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryHit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(filters): Query<SearchFilters>,
) -> ApiResult<Json<Value>> {
    match filters.kind.as_deref().unwrap_or("parts") {
        "parts" => search_parts(&state, &filters).await,
        "categories" => search_categories(&state, &filters).await,
        _ => Err(ApiError::validation_msg(
            "invalid_search_type",
            "Invalid search type",
        )),
    }
}

async fn search_parts(state: &AppState, filters: &SearchFilters) -> ApiResult<Json<Value>> {
    let query = PartSearchQuery::build(filters)?;
    let pg = filters.pagination();

    let (count_sql, count_args) = query.count_query();
    let total: i64 = bind_query_scalar(sqlx::query_scalar(&count_sql), &count_args)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::datastore)?;

    let (page_sql, page_args) = query.page_query(&pg);
    let parts: Vec<PartHit> = bind_query_as(sqlx::query_as(&page_sql), &page_args)
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

async fn search_categories(state: &AppState, filters: &SearchFilters) -> ApiResult<Json<Value>> {
    let term = filters
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation_msg("missing_query", "Search query is required"))?;

    let like = format!("%{term}%");
    let categories = sqlx::query_as::<_, CategoryHit>(
        "SELECT id, name, description FROM part_categories \
         WHERE name ILIKE $1 OR description ILIKE $1 ORDER BY name ASC",
    )
    .bind(like)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::datastore)?;

    Ok(Json(json!({ "success": true, "data": categories })))
}
