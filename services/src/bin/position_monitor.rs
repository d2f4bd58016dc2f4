//! Binary entrypoint for the Position Monitor: diffs the broker's live
//! position view after every drain and publishes `position_updates`.

use clap::Parser;
use fb_bus::topology::EVENTS_EXCHANGE;
use fb_bus::{BusPublisher, ExchangeKind};
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::position_monitor::PositionMonitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_position_monitor", &config.logging);

    let publisher =
        BusPublisher::connect(&config.rabbitmq.url, EVENTS_EXCHANGE, ExchangeKind::Direct).await?;

    let monitor = PositionMonitor::new(
        config.tq.portfolio_id.clone(),
        publisher,
        tokio::runtime::Handle::current(),
    );

    fb_services::run_monitor_service(&config, monitor).await?;

    Ok(())
}
