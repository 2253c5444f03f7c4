use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use seating_server::clock::SystemClock;
use seating_server::config::{Config, StoreBackend};
use seating_server::routes::create_routes;
use seating_server::services::holds::spawn_reaper;
use seating_server::services::{LogNotifier, SeatCatalog};
use seating_server::state::AppState;
use seating_server::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seating_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let catalog = match &config.seat_catalog_path {
        Some(path) => {
            let catalog = SeatCatalog::from_file(path)?;
            tracing::info!(
                "Loaded seat catalog for {} event(s) from {}",
                catalog.event_count(),
                path.display()
            );
            catalog
        }
        None => {
            tracing::warn!("SEAT_CATALOG_PATH not set, seat labels will not be validated");
            SeatCatalog::default()
        }
    };

    let clock = Arc::new(SystemClock);
    let notifier = Arc::new(LogNotifier);

    let state = match config.store_backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database_url, config.max_connections).await?;
            tracing::info!("Successfully connected to database");

            store.migrate().await?;
            tracing::info!("Migrations run successfully");

            AppState::new(Arc::new(store), catalog, clock, notifier, config.holds.clone())
        }
        StoreBackend::Memory => {
            let store = match &config.store_seed_path {
                Some(path) => MemoryStore::from_seed_file(path)?,
                None => MemoryStore::new(),
            };
            tracing::warn!("Using in-memory store, nothing will be persisted");
            AppState::new(Arc::new(store), catalog, clock, notifier, config.holds.clone())
        }
    };

    if config.holds.reap_interval_secs > 0 {
        spawn_reaper(
            state.holds.clone(),
            Duration::from_secs(config.holds.reap_interval_secs),
        );
        tracing::info!(
            "Seat hold reaper running every {}s",
            config.holds.reap_interval_secs
        );
    }

    let app: Router = create_routes(state, &config.cors_allowed_origins);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
