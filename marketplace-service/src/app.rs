use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method, StatusCode,
};
use axum::routing::{get, post};
use axum::Router;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};
use sqlx::PgPool;
use std::env;

use crate::car_handlers::{list_makes, list_models};
use crate::category_handlers::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use crate::inventory_handlers::{
    add_inventory, get_inventory, list_inventory, remove_inventory, update_inventory,
};
use crate::order_handlers::{
    cancel_order, create_order, get_order, list_orders, update_order_status,
};
use crate::part_handlers::{create_part, delete_part, get_part, list_parts, update_part};
use crate::search_handlers::search;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

/// Environment-driven runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8086);
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);
        Ok(AppConfig {
            database_url,
            host,
            port,
            allowed_origins,
        })
    }
}

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "http_errors_total",
            "Count of HTTP error responses emitted (status >= 400)",
        ),
        &["service", "code", "status"],
    )
    .expect("http_errors_total");
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
});

async fn track_http_errors(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, axum::response::Response> {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        HTTP_ERRORS_TOTAL
            .with_label_values(&["marketplace-service", code, status.as_str()])
            .inc();
    }
    Ok(resp)
}

async fn render_metrics() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn health() -> &'static str {
    "ok"
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, HeaderName::from_static("x-user-id")]);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .route("/search", get(search))
        .route("/parts", get(list_parts).post(create_part))
        .route(
            "/parts/:part_id",
            get(get_part).put(update_part).delete(delete_part),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/cars/makes", get(list_makes))
        .route("/cars/makes/:make_id/models", get(list_models))
        .route("/inventory", get(list_inventory).post(add_inventory))
        .route(
            "/inventory/:inventory_id",
            get(get_inventory)
                .put(update_inventory)
                .delete(remove_inventory),
        )
        .route("/orders", post(create_order).get(list_orders))
        .route(
            "/orders/:order_id",
            get(get_order).put(update_order_status).delete(cancel_order),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(track_http_errors))
        .layer(cors)
}
