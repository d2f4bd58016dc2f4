//! Order Monitor: diffs the broker's live order view after every drain and
//! publishes an `OrderUpdate` for every new or changed order.

use chrono::Utc;
use fb_broker::BrokerGateway;
use fb_bus::BusPublisher;
use fb_bus::topology::ORDER_UPDATES_ROUTING_KEY;
use fb_core::diff::{DiffEvent, SnapshotDiffer};
use fb_core::error::BridgeError;
use fb_core::model::events::OrderUpdate;
use fb_core::model::order::OrderSnapshot;

use crate::skeleton::MonitorHandler;

pub struct OrderMonitor {
    portfolio_id: String,
    publisher: BusPublisher,
    rt: tokio::runtime::Handle,
    differ: SnapshotDiffer<String, OrderSnapshot>,
}

impl OrderMonitor {
    pub fn new(portfolio_id: String, publisher: BusPublisher, rt: tokio::runtime::Handle) -> Self {
        Self {
            portfolio_id,
            publisher,
            rt,
            differ: SnapshotDiffer::new(),
        }
    }

    fn publish(&self, order_id: &str, snapshot: &OrderSnapshot, full_order: fb_core::model::Order) {
        let update = OrderUpdate {
            timestamp: Utc::now(),
            portfolio_id: self.portfolio_id.clone(),
            event_type: fb_core::model::order::classify_order_event(
                snapshot.status,
                snapshot.volume_orign,
                snapshot.volume_left,
            ),
            order: full_order,
        };
        let result = self.rt.block_on(
            self.publisher
                .publish(ORDER_UPDATES_ROUTING_KEY, &update),
        );
        if let Err(e) = result {
            tracing::error!(order_id, error = %e, "failed to publish order update");
        }
    }
}

impl MonitorHandler for OrderMonitor {
    fn on_tick(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let current: std::collections::HashMap<String, OrderSnapshot> = gateway
            .orders()
            .iter()
            .map(|(id, order)| (id.clone(), OrderSnapshot::from(order)))
            .collect();

        let events = self.differ.diff_no_close(current);
        for event in events {
            if let DiffEvent::Create { key, value } | DiffEvent::Update { key, value } = event {
                if let Some(order) = gateway.orders().get(&key).cloned() {
                    self.publish(&key, &value, order);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_broker::mock::MockGateway;
    use fb_broker::Credentials;
    use fb_core::model::order::{Direction, Offset};

    fn creds() -> Credentials {
        Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        }
    }

    #[test]
    fn first_tick_diffs_all_orders_as_creates() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();

        let mut differ: SnapshotDiffer<String, OrderSnapshot> = SnapshotDiffer::new();
        let current: std::collections::HashMap<String, OrderSnapshot> = gw
            .orders()
            .iter()
            .map(|(id, order)| (id.clone(), OrderSnapshot::from(order)))
            .collect();
        let events = differ.diff_no_close(current);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DiffEvent::Create { .. }));
    }

    #[test]
    fn cancel_after_insert_yields_an_update_not_a_close() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();

        let mut differ: SnapshotDiffer<String, OrderSnapshot> = SnapshotDiffer::new();
        let first: std::collections::HashMap<String, OrderSnapshot> = gw
            .orders()
            .iter()
            .map(|(id, order)| (id.clone(), OrderSnapshot::from(order)))
            .collect();
        differ.diff_no_close(first);

        gw.cancel_order("A").unwrap();
        let second: std::collections::HashMap<String, OrderSnapshot> = gw
            .orders()
            .iter()
            .map(|(id, order)| (id.clone(), OrderSnapshot::from(order)))
            .collect();
        let events = differ.diff_no_close(second);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DiffEvent::Update { .. }));
    }
}
