//! Position Handler: the legacy cache-write path for `internal.position_updates`,
//! kept alongside the Position Reconciler's own direct writes per message
//! rather than polling.

use fb_core::error::BridgeError;
use fb_core::model::events::PositionUpdate;
use fb_storage::CacheClient;

pub struct PositionHandler {
    cache: CacheClient,
}

impl PositionHandler {
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    pub async fn process(&self, update: PositionUpdate) -> Result<(), BridgeError> {
        self.cache
            .set_position(&update.portfolio_id, &update.symbol, &update.position)
            .await
            .map_err(|e| e.into_bridge_error("position_cache_write"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fb_core::model::FullPosition;

    #[test]
    fn position_update_envelope_carries_symbol_and_snapshot() {
        let update = PositionUpdate {
            timestamp: Utc::now(),
            portfolio_id: "P1".into(),
            symbol: "SHFE.rb2505".into(),
            position: FullPosition::zero(),
        };
        assert_eq!(update.symbol, "SHFE.rb2505");
    }
}
