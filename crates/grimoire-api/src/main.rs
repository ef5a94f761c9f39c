//! grimoire-api — HTTP API server for the grimoire note backend.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grimoire_api::auth::HmacTokenVerifier;
use grimoire_api::config::{Config, StoreBackend};
use grimoire_api::{ApiServer, AppState};
use grimoire_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required"))?;
            let db = Database::connect(url).await?;
            info!(subsystem = "api", op = "startup", store = "postgres", "store ready");
            db
        }
        StoreBackend::Memory => {
            info!(subsystem = "api", op = "startup", store = "memory", "store ready");
            Database::in_memory()
        }
    };

    let verifier = Arc::new(HmacTokenVerifier::new(&config.auth_secret));
    let state = AppState::new(db, verifier);

    let server = ApiServer::start(&config, state).await?;
    info!("Server listening on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    server.stop().await?;

    Ok(())
}
