//! Position Reconciler: the authoritative writer of position cache state.
//! Runs its reconciliation cycle at most once per `POSITION_LOOP_INTERVAL_SECONDS`;
//! between cycles it still drains to keep the broker session alive.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use fb_broker::BrokerGateway;
use fb_core::error::BridgeError;
use fb_core::model::FullPosition;
use fb_storage::{CacheClient, UniverseLoader};

use crate::skeleton::MonitorHandler;

pub struct PositionReconciler {
    portfolio_id: String,
    cache: CacheClient,
    universe: UniverseLoader,
    rt: tokio::runtime::Handle,
    interval: Duration,
    last_cycle: Option<Instant>,
}

impl PositionReconciler {
    pub fn new(
        portfolio_id: String,
        cache: CacheClient,
        universe: UniverseLoader,
        rt: tokio::runtime::Handle,
        interval: Duration,
    ) -> Self {
        Self {
            portfolio_id,
            cache,
            universe,
            rt,
            interval,
            last_cycle: None,
        }
    }

    fn run_cycle(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let universe_symbols = self.rt.block_on(self.universe.load());
        let broker_positions: HashMap<String, FullPosition> = gateway.positions().clone();

        for (symbol, broker_value) in &broker_positions {
            if !broker_value.is_consistent() {
                tracing::error!(symbol, ?broker_value, "broker position breakdown is inconsistent");
            }

            let cached = self
                .rt
                .block_on(self.cache.get_position(&self.portfolio_id, symbol))
                .map_err(|e| e.into_bridge_error("position_cache_read"))?;

            match cached {
                None => {}
                Some(cached_value) if cached_value == *broker_value => {}
                Some(_) => {
                    tracing::warn!(symbol, "cached position mismatch, broker value wins");
                }
            }

            self.rt
                .block_on(self.cache.set_position(&self.portfolio_id, symbol, broker_value))
                .map_err(|e| e.into_bridge_error("position_cache_write"))?;
        }

        for symbol in &universe_symbols {
            if !broker_positions.contains_key(symbol) {
                self.rt
                    .block_on(self.cache.set_position(&self.portfolio_id, symbol, &FullPosition::zero()))
                    .map_err(|e| e.into_bridge_error("position_cache_zero_write"))?;
            }
        }

        Ok(())
    }
}

impl MonitorHandler for PositionReconciler {
    fn on_tick(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let now = Instant::now();
        if let Some(last) = self.last_cycle {
            if now.duration_since(last) < self.interval {
                return Ok(());
            }
        }
        self.last_cycle = Some(now);
        self.run_cycle(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_position_entries_are_only_written_for_untracked_symbols() {
        let broker_positions: HashMap<String, FullPosition> =
            HashMap::from([("SHFE.rb2505".to_string(), FullPosition::new(1, 0, 0, 0))]);
        let universe = vec!["SHFE.rb2505".to_string(), "DCE.m2505".to_string()];

        let missing: Vec<&String> = universe
            .iter()
            .filter(|s| !broker_positions.contains_key(*s))
            .collect();

        assert_eq!(missing, vec!["DCE.m2505"]);
    }
}
