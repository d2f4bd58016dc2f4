//! Binary entrypoint for the Order Submitter: consumes `tq_order_submit_requests`
//! and drives the six-stage submit pipeline against the Broker Gateway.

use clap::Parser;
use fb_bus::topology::{portfolio_routing_key, ORDERS_EXCHANGE, ORDER_SUBMIT_QUEUE};
use fb_bus::ExchangeKind;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::submitter::OrderSubmitter;
use fb_storage::{CacheClient, DbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_order_submitter", &config.logging);

    let db = DbClient::connect(&config.database).await?;
    db.run_migrations().await?;
    let cache = CacheClient::connect(&config.redis).await?;

    let submitter = OrderSubmitter::new(
        config.tq.portfolio_id.clone(),
        db,
        cache,
        tokio::runtime::Handle::current(),
    );

    fb_services::run_broker_service(
        &config,
        ORDER_SUBMIT_QUEUE,
        ORDERS_EXCHANGE,
        ExchangeKind::Topic,
        portfolio_routing_key(&config.tq.portfolio_id),
        submitter,
    )
    .await?;

    Ok(())
}
