use sqlx::PgPool;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use marketplace_service::{build_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    let db = PgPool::connect(&config.database_url).await?;
    // Ensure database schema is up to date before serving traffic
    sqlx::migrate!("./migrations").run(&db).await?;

    let state = AppState { db };
    let app = build_router(state, &config.allowed_origins);

    let ip: std::net::IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((ip, config.port));
    println!("starting marketplace-service on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
