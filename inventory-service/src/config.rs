use clap::Parser;
use shared::config::TelemetrySettings;
use shared::ProductRecord;

#[derive(Debug, Parser)]
#[command(name = "inventory-service")]
pub struct Args {
    #[command(flatten)]
    pub telemetry: TelemetrySettings,

    #[arg(long, env = "DATABASE_URL", default_value = "inventory.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "8002")]
    pub port: u16,

    /// Product to upsert at startup, as `<id>:<name>:<stock>`. Repeatable.
    #[arg(long = "seed", value_parser = parse_seed)]
    pub seeds: Vec<ProductRecord>,
}

fn parse_seed(value: &str) -> Result<ProductRecord, String> {
    let (id, rest) = value
        .split_once(':')
        .ok_or_else(|| format!("expected <id>:<name>:<stock>, got `{value}`"))?;
    let (name, stock) = rest
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <id>:<name>:<stock>, got `{value}`"))?;

    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid product id `{id}`: {e}"))?;
    let stock = stock
        .trim()
        .parse()
        .map_err(|e| format!("invalid stock `{stock}`: {e}"))?;
    if name.is_empty() {
        return Err("product name must not be empty".to_string());
    }

    Ok(ProductRecord {
        id,
        name: name.to_string(),
        stock,
    })
}
