//! Position Monitor: diffs the broker's live position view after every
//! drain and publishes a `PositionUpdate` for every changed symbol. Distinct
//! from the Position Reconciler (§4.4), which bypasses the bus and owns the
//! cache directly — this is the bus-diff-and-publish counterpart, paired
//! with the Position Handler on the consuming side.

use chrono::Utc;
use fb_broker::BrokerGateway;
use fb_bus::topology::POSITION_UPDATES_ROUTING_KEY;
use fb_bus::BusPublisher;
use fb_core::diff::{DiffEvent, SnapshotDiffer};
use fb_core::error::BridgeError;
use fb_core::model::events::PositionUpdate;
use fb_core::model::FullPosition;

use crate::skeleton::MonitorHandler;

pub struct PositionMonitor {
    portfolio_id: String,
    publisher: BusPublisher,
    rt: tokio::runtime::Handle,
    differ: SnapshotDiffer<String, FullPosition>,
}

impl PositionMonitor {
    pub fn new(portfolio_id: String, publisher: BusPublisher, rt: tokio::runtime::Handle) -> Self {
        Self {
            portfolio_id,
            publisher,
            rt,
            differ: SnapshotDiffer::new(),
        }
    }

    fn publish(&self, symbol: &str, position: FullPosition) {
        let update = PositionUpdate {
            timestamp: Utc::now(),
            portfolio_id: self.portfolio_id.clone(),
            symbol: symbol.to_string(),
            position,
        };
        let result = self.rt.block_on(
            self.publisher
                .publish(POSITION_UPDATES_ROUTING_KEY, &update),
        );
        if let Err(e) = result {
            tracing::error!(symbol, error = %e, "failed to publish position update");
        }
    }
}

impl MonitorHandler for PositionMonitor {
    fn on_tick(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let current: std::collections::HashMap<String, FullPosition> =
            gateway.positions().clone();

        let events = self.differ.diff(current);
        for event in events {
            match event {
                DiffEvent::Create { key, value } | DiffEvent::Update { key, value } => {
                    self.publish(&key, value);
                }
                DiffEvent::Closed { key } => {
                    self.publish(&key, FullPosition::zero());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn first_tick_diffs_all_positions_as_creates() {
        let mut differ: SnapshotDiffer<String, FullPosition> = SnapshotDiffer::new();
        let mut current = HashMap::new();
        current.insert("SHFE.rb2505".to_string(), FullPosition::new(1, 0, 0, 0));
        let events = differ.diff(current);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DiffEvent::Create { .. }));
    }

    #[test]
    fn disappearing_symbol_emits_closed_and_zeros_out() {
        let mut differ: SnapshotDiffer<String, FullPosition> = SnapshotDiffer::new();
        let mut first = HashMap::new();
        first.insert("SHFE.rb2505".to_string(), FullPosition::new(1, 0, 0, 0));
        differ.diff(first);

        let events = differ.diff(HashMap::new());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], DiffEvent::Closed { key } if key == "SHFE.rb2505"));
    }

    #[test]
    fn position_closing_to_flat_within_the_map_is_an_update() {
        let mut differ: SnapshotDiffer<String, FullPosition> = SnapshotDiffer::new();
        let mut first = HashMap::new();
        first.insert("SHFE.rb2505".to_string(), FullPosition::new(1, 0, 0, 0));
        differ.diff(first);

        let mut second = HashMap::new();
        second.insert("SHFE.rb2505".to_string(), FullPosition::zero());
        let events = differ.diff(second);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DiffEvent::Update { .. }));
    }
}
