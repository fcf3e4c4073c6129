use clap::Parser;
use shared::config::TelemetrySettings;

#[derive(Debug, Parser)]
#[command(name = "order-service")]
pub struct Args {
    #[command(flatten)]
    pub telemetry: TelemetrySettings,

    #[arg(long, env = "DATABASE_URL", default_value = "orders.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "8001")]
    pub port: u16,

    #[arg(long, env = "INVENTORY_SERVICE_URL", default_value = "http://localhost:8002")]
    pub inventory_service_url: String,
}
