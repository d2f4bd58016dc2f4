//! Binary entrypoint for the Canceller: consumes `tq_order_cancel_requests`
//! and applies the three CANCEL command variants.

use clap::Parser;
use fb_bus::topology::{portfolio_routing_key, ORDERS_EXCHANGE, ORDER_CANCEL_QUEUE};
use fb_bus::ExchangeKind;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::canceller::OrderCanceller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_order_canceller", &config.logging);

    fb_services::run_broker_service(
        &config,
        ORDER_CANCEL_QUEUE,
        ORDERS_EXCHANGE,
        ExchangeKind::Topic,
        portfolio_routing_key(&config.tq.portfolio_id),
        OrderCanceller::new(),
    )
    .await?;

    Ok(())
}
