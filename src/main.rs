use anyhow::{Context, Result};
use weather_records::{AppConfig, VERSION, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    tracing::info!(version = VERSION, "Starting weather records service");
    web::run(config).await
}
