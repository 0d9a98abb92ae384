use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_records::config::AppConfig;
use campus_records::services::{seed_service, user_service};
use campus_records::{app_router, ensure_schema_exists, init_db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = init_db(&config.database_url).await?;

    ensure_schema_exists(&db).await?;
    tracing::info!("Database schema initialized");

    if let Some(seed) = &config.admin_seed {
        user_service::seed_admin(&db, seed).await?;
    }
    if config.seed_demo_data {
        seed_service::seed_demo_data(&db).await?;
    }

    let app = app_router(Arc::new(db), config.cors_allow_origin.as_deref());

    start_server(app, config.bind_addr).await?;

    Ok(())
}

async fn start_server(app: axum::Router, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Server started on {}", addr);

    match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => {
            axum::serve(listener, app.into_make_service()).await?;
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to bind to address: {}", e);
            Err(e.into())
        }
    }
}
