//! Binary entrypoint for the Position Handler: the legacy per-message cache
//! write path for `internal.position_updates`.

use std::sync::Arc;

use clap::Parser;
use fb_bus::topology::{EVENTS_EXCHANGE, POSITION_UPDATES_QUEUE, POSITION_UPDATES_ROUTING_KEY};
use fb_bus::ExchangeKind;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::position_handler::PositionHandler;
use fb_storage::CacheClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_position_handler", &config.logging);

    let cache = CacheClient::connect(&config.redis).await?;
    let handler = Arc::new(PositionHandler::new(cache));

    fb_services::run_handler_service(
        &config,
        POSITION_UPDATES_QUEUE,
        EVENTS_EXCHANGE,
        ExchangeKind::Direct,
        POSITION_UPDATES_ROUTING_KEY.to_string(),
        move |update| {
            let handler = Arc::clone(&handler);
            async move { handler.process(update).await }
        },
    )
    .await;

    Ok(())
}
