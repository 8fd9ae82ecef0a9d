//! Service entry point: logging, settings, database, HTTP listener.

use dotenvy::dotenv;
use hearthfund::{
    api::{self, AppState},
    config::{self, Settings},
    errors::Result,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing as early as possible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // .env is optional; env vars can be set externally
    dotenv().ok();

    let settings = Settings::load()?;

    let db = config::database::create_connection(&settings.database_url).await?;
    info!("Database connection established.");

    // First run creates the schema; later runs find the tables in place
    if let Err(e) = config::database::create_tables(&db).await {
        warn!("Skipping table creation: {e}");
    }

    let bind_addr = settings.bind_addr.clone();
    let state = AppState {
        db: Arc::new(db),
        settings: Arc::new(settings),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {bind_addr}");
    axum::serve(listener, api::router(state)).await?;

    Ok(())
}
