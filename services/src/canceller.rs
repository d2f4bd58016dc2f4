//! Canceller: the three CANCEL command variants consumed from
//! `tq_order_cancel_requests`.

use std::time::{Duration, Instant};

use fb_broker::BrokerGateway;
use fb_core::constants::{BLOCK_TIMEOUT, CANCEL_ALL_PER_ORDER_TIMEOUT};
use fb_core::error::BridgeError;
use fb_core::model::exchange::normalize_instrument_id;
use fb_core::model::order::{CancelType, OrderAction, OrderRequest, OrderStatus};

use crate::skeleton::WorkerHandler;

#[derive(Default)]
pub struct OrderCanceller;

impl OrderCanceller {
    pub fn new() -> Self {
        Self
    }

    fn cancel_by_order_id(&self, gateway: &mut dyn BrokerGateway, order_id: &str) -> Result<(), BridgeError> {
        let Some(order) = gateway.orders().get(order_id) else {
            tracing::warn!(order_id, "cancel requested for unknown order, ignoring");
            return Ok(());
        };
        if order.status != OrderStatus::Alive {
            tracing::info!(order_id, "order already finished, nothing to cancel");
            return Ok(());
        }

        gateway
            .cancel_order(order_id)
            .map_err(|e| BridgeError::broker_call("cancel_order", e))?;

        self.drain_until_finished(gateway, order_id, BLOCK_TIMEOUT)
    }

    fn cancel_by_contract_code(&self, gateway: &mut dyn BrokerGateway, contract_code: &str) -> Result<(), BridgeError> {
        let targets: Vec<String> = gateway
            .orders()
            .values()
            .filter(|o| o.status == OrderStatus::Alive)
            .filter(|o| normalize_instrument_id(&o.instrument_id) == contract_code)
            .map(|o| o.order_id.clone())
            .collect();

        for order_id in &targets {
            if let Err(e) = gateway.cancel_order(order_id) {
                tracing::error!(order_id, error = %e, "cancel failed, continuing");
                continue;
            }
        }
        for order_id in &targets {
            let _ = self.drain_until_finished(gateway, order_id, BLOCK_TIMEOUT);
        }
        Ok(())
    }

    fn cancel_all(&self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let targets: Vec<String> = gateway
            .orders()
            .values()
            .filter(|o| o.status == OrderStatus::Alive)
            .map(|o| o.order_id.clone())
            .collect();

        for order_id in &targets {
            if let Err(e) = gateway.cancel_order(order_id) {
                tracing::error!(order_id, error = %e, "cancel failed during cancel_all, continuing");
                continue;
            }
            if self
                .drain_until_finished(gateway, order_id, CANCEL_ALL_PER_ORDER_TIMEOUT)
                .is_err()
            {
                tracing::warn!(order_id, "order still alive after per-order cancel_all timeout");
            }
        }
        Ok(())
    }

    /// Drains until `order_id` leaves `ALIVE` or `deadline` elapses.
    fn drain_until_finished(
        &self,
        gateway: &mut dyn BrokerGateway,
        order_id: &str,
        deadline: Duration,
    ) -> Result<(), BridgeError> {
        let started = Instant::now();
        loop {
            let is_alive = gateway
                .orders()
                .get(order_id)
                .map(|o| o.status == OrderStatus::Alive)
                .unwrap_or(false);
            if !is_alive {
                return Ok(());
            }
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(BridgeError::broker_call(
                    "cancel_drain_timeout",
                    format!("order {order_id} still alive after {deadline:?}"),
                ));
            }
            gateway
                .drain(remaining)
                .map_err(|e| BridgeError::broker_call("drain", e))?;
        }
    }
}

impl WorkerHandler<OrderRequest> for OrderCanceller {
    fn on_message(&mut self, gateway: &mut dyn BrokerGateway, request: OrderRequest) -> Result<(), BridgeError> {
        if request.action != OrderAction::Cancel {
            tracing::warn!(order_id = %request.order_id, "canceller received a non-cancel action, ignoring");
            return Ok(());
        }

        match request.cancel_type {
            Some(CancelType::OrderId) => self.cancel_by_order_id(gateway, &request.order_id),
            Some(CancelType::ContractCode) => {
                let Some(contract_code) = request.contract_code.as_deref() else {
                    tracing::warn!("contract_code cancel missing contract_code field, ignoring");
                    return Ok(());
                };
                self.cancel_by_contract_code(gateway, contract_code)
            }
            Some(CancelType::All) => self.cancel_all(gateway),
            None => {
                tracing::warn!(order_id = %request.order_id, "cancel command missing cancel_type, ignoring");
                Ok(())
            }
        }
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
    fn cancel_by_order_id_finishes_an_alive_order() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();

        let canceller = OrderCanceller::new();
        canceller.cancel_by_order_id(&mut gw, "A").unwrap();
        assert_eq!(gw.orders()["A"].status, OrderStatus::Finished);
    }

    #[test]
    fn cancel_by_order_id_ignores_unknown_order() {
        let mut gw = MockGateway::new(creds());
        let canceller = OrderCanceller::new();
        assert!(canceller.cancel_by_order_id(&mut gw, "missing").is_ok());
    }

    #[test]
    fn cancel_by_order_id_is_a_noop_for_already_finished_order() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();
        gw.cancel_order("A").unwrap();

        let canceller = OrderCanceller::new();
        assert!(canceller.cancel_by_order_id(&mut gw, "A").is_ok());
    }

    #[test]
    fn cancel_by_contract_code_filters_by_normalized_instrument_id() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();
        gw.insert_order("B", "DCE.m2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();

        let canceller = OrderCanceller::new();
        canceller.cancel_by_contract_code(&mut gw, "rb2505").unwrap();

        assert_eq!(gw.orders()["A"].status, OrderStatus::Finished);
        assert_eq!(gw.orders()["B"].status, OrderStatus::Alive);
    }

    #[test]
    fn cancel_all_finishes_every_alive_order() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();
        gw.insert_order("B", "DCE.m2505", Direction::Buy, Offset::Open, 1, None)
            .unwrap();

        let canceller = OrderCanceller::new();
        canceller.cancel_all(&mut gw).unwrap();

        assert_eq!(gw.orders()["A"].status, OrderStatus::Finished);
        assert_eq!(gw.orders()["B"].status, OrderStatus::Finished);
    }
}
