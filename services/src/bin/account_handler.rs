//! Binary entrypoint for the Account Handler: writes every
//! `internal.account_updates` message through to the account cache.

use std::sync::Arc;

use clap::Parser;
use fb_bus::topology::{ACCOUNT_UPDATES_QUEUE, ACCOUNT_UPDATES_ROUTING_KEY, EVENTS_EXCHANGE};
use fb_bus::ExchangeKind;
use fb_core::config::{BridgeConfig, CliArgs};
use fb_services::account_handler::AccountHandler;
use fb_storage::CacheClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = BridgeConfig::load(&cli)?;
    let _guard = fb_core::logging::init("tq_account_handler", &config.logging);

    let cache = CacheClient::connect(&config.redis).await?;
    let handler = Arc::new(AccountHandler::new(cache));

    fb_services::run_handler_service(
        &config,
        ACCOUNT_UPDATES_QUEUE,
        EVENTS_EXCHANGE,
        ExchangeKind::Direct,
        ACCOUNT_UPDATES_ROUTING_KEY.to_string(),
        move |update| {
            let handler = Arc::clone(&handler);
            async move { handler.process(update).await }
        },
    )
    .await;

    Ok(())
}
