use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use inventory_service::api::{self, AppState};
use inventory_service::config::Args;
use inventory_service::handlers::InventoryHandler;
use inventory_service::models::Product;
use inventory_service::storage::ProductStore;
use shared::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = shared::config::load_env_file()?;
    let args = Args::parse();
    let telemetry = telemetry::init_telemetry(&args.telemetry)?;
    if let Some(path) = env_file {
        info!("Loaded settings from {}", path.display());
    }

    info!("Running database migrations...");
    let store = ProductStore::new(args.database_url.as_str());
    store.run_migrations()?;
    info!("Migrations completed successfully");

    for seed in args.seeds {
        info!(product_id = seed.id, stock = seed.stock, "Seeding product {}", seed.name);
        store.upsert(Product::from(seed)).await?;
    }

    let state = AppState {
        handler: Arc::new(InventoryHandler::new(store)),
    };
    let app = api::create_router(state, args.telemetry.identity(), telemetry.http_metrics());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;

    info!(
        environment = %args.telemetry.app_env,
        "Inventory service listening on port {}", args.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shared::shutdown_signal())
        .await?;

    info!("Inventory service stopped");
    Ok(())
}
