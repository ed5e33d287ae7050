use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use carefinder::config::LoggingConfig;
use carefinder::{
    CareFinderConfig, ClosestErService, DeviceAddressClient, ErWaitFeedClient,
    GoogleGeocodingClient, LocationResolver, SkillHandler, web,
};

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CareFinderConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(version = carefinder::VERSION, "CareFinder starting");

    let geocoder = GoogleGeocodingClient::new(&config.geocoding)?;
    let feed = ErWaitFeedClient::new(&config.feed)?;
    let address_lookup = DeviceAddressClient::new(&config.device_address)?;

    let finder = ClosestErService::new(
        LocationResolver::new(Arc::new(geocoder)),
        Arc::new(feed),
        config.feed.hostname.clone(),
        config.feed.path.clone(),
    );
    let handler = Arc::new(SkillHandler::new(
        config.skill.clone(),
        Arc::new(address_lookup),
        finder,
    ));

    web::run(&config.server, handler)
        .await
        .context("Skill endpoint stopped")?;
    Ok(())
}
