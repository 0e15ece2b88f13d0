pub mod app;
pub mod auth;
pub mod car_handlers;
pub mod category_handlers;
pub mod inventory_handlers;
pub mod money;
pub mod order_handlers;
pub mod part_handlers;
pub mod search;
pub mod search_handlers;
pub mod sql;

pub use app::{build_router, AppConfig, AppState};
