use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use order_service::api::{self, AppState};
use order_service::client::HttpInventoryClient;
use order_service::config::Args;
use order_service::handlers::OrderHandler;
use order_service::storage::OrderStore;
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
    let store = OrderStore::new(args.database_url.as_str());
    store.run_migrations()?;
    info!("Migrations completed successfully");

    let inventory = Arc::new(HttpInventoryClient::new(args.inventory_service_url.as_str()));
    let state = AppState {
        handler: Arc::new(OrderHandler::new(store, inventory)),
    };
    let app = api::create_router(state, args.telemetry.identity(), telemetry.http_metrics());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;

    info!(
        environment = %args.telemetry.app_env,
        inventory_service_url = %args.inventory_service_url,
        "Order service listening on port {}", args.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shared::shutdown_signal())
        .await?;

    info!("Order service stopped");
    Ok(())
}
