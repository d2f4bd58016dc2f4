//! Binary entrypoint for the Order Monitor: diffs the broker's live order
//! view after every drain and publishes `order_updates`.

use clap::Parser;
use fb_bus::topology::EVENTS_EXCHANGE;
use fb_bus::{BusPublisher, ExchangeKind};
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::order_monitor::OrderMonitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_order_monitor", &config.logging);

    let publisher =
        BusPublisher::connect(&config.rabbitmq.url, EVENTS_EXCHANGE, ExchangeKind::Direct).await?;

    let monitor = OrderMonitor::new(
        config.tq.portfolio_id.clone(),
        publisher,
        tokio::runtime::Handle::current(),
    );

    fb_services::run_monitor_service(&config, monitor).await?;

    Ok(())
}
