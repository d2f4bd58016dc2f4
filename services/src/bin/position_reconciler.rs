//! Binary entrypoint for the Position Reconciler: the authoritative writer
//! of position cache state, gated to one cycle per `POSITION_LOOP_INTERVAL_SECONDS`.

use std::time::Duration;

use clap::Parser;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_core::constants::{POSITION_LOOP_INTERVAL_SECONDS, UNIVERSE_REFRESH_SECONDS};
use fb_services::position_reconciler::PositionReconciler;
use fb_storage::{CacheClient, DbClient, UniverseLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_position_reconciler", &config.logging);

    let db = DbClient::connect(&config.database).await?;
    let cache = CacheClient::connect(&config.redis).await?;
    let universe = UniverseLoader::new(
        db.pool().clone(),
        Duration::from_secs(UNIVERSE_REFRESH_SECONDS),
    );

    let reconciler = PositionReconciler::new(
        config.tq.portfolio_id.clone(),
        cache,
        universe,
        tokio::runtime::Handle::current(),
        Duration::from_secs(POSITION_LOOP_INTERVAL_SECONDS),
    );

    fb_services::run_monitor_service(&config, reconciler).await?;

    Ok(())
}
