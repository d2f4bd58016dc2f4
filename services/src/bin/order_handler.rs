//! Binary entrypoint for the Order Handler: the idempotent-monotonic
//! writer for `internal.order_updates`.

use std::sync::Arc;

use clap::Parser;
use fb_bus::topology::{EVENTS_EXCHANGE, ORDER_UPDATES_QUEUE, ORDER_UPDATES_ROUTING_KEY};
use fb_bus::ExchangeKind;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::order_handler::OrderHandler;
use fb_storage::DbClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_order_handler", &config.logging);

    let db = DbClient::connect(&config.database).await?;
    db.run_migrations().await?;
    let handler = Arc::new(OrderHandler::new(db));

    fb_services::run_handler_service(
        &config,
        ORDER_UPDATES_QUEUE,
        EVENTS_EXCHANGE,
        ExchangeKind::Direct,
        ORDER_UPDATES_ROUTING_KEY.to_string(),
        move |update| {
            let handler = Arc::clone(&handler);
            async move { handler.process(update).await }
        },
    )
    .await;

    Ok(())
}
