//! Order Handler: the idempotent-monotonic writer for `internal.order_updates`.
//! Applies each update via [`DbClient::update_order`] and persists any new
//! fills, relying on the table's ordering rules rather than its own.

use fb_core::error::BridgeError;
use fb_core::model::events::OrderUpdate;
use fb_storage::DbClient;

pub struct OrderHandler {
    db: DbClient,
}

impl OrderHandler {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    pub async fn process(&self, update: OrderUpdate) -> Result<(), BridgeError> {
        self.db
            .update_order(&update.order)
            .await
            .map_err(|e| e.into_bridge_error("order_update"))?;

        for trade in &update.order.trades {
            self.db
                .insert_trade(trade)
                .await
                .map_err(|e| e.into_bridge_error("trade_insert"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_core::model::order::{Direction, Offset, OrderEventType, OrderRequest, OrderStatus};
    use fb_core::model::Order;
    use chrono::Utc;

    fn sample_order() -> Order {
        let request = OrderRequest {
            action: fb_core::model::order::OrderAction::Submit,
            order_id: "A".into(),
            portfolio_id: "P1".into(),
            symbol: Some("SHFE.rb2505".into()),
            direction: Some(Direction::Buy),
            offset: Some(Offset::Open),
            volume: Some(2),
            limit_price: None,
            timestamp: Some(0),
            cancel_type: None,
            contract_code: None,
        };
        Order::new_alive(&request, "SHFE.rb2505".into())
    }

    #[test]
    fn order_update_envelope_carries_the_classified_event() {
        let update = OrderUpdate {
            timestamp: Utc::now(),
            portfolio_id: "P1".into(),
            event_type: OrderEventType::New,
            order: sample_order(),
        };
        assert_eq!(update.order.status, OrderStatus::Alive);
        assert_eq!(update.event_type, OrderEventType::New);
    }
}
