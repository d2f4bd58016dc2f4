//! Order Submitter: six-stage pipeline from an inbound SUBMIT command to a
//! persisted order row and a broker-side `insert_order` call.

use std::time::Duration;

use chrono::Utc;
use fb_broker::BrokerGateway;
use fb_core::constants::ORDER_EXPIRE_ALLOW_MAX_SECS;
use fb_core::error::BridgeError;
use fb_core::model::exchange::{exchange_of_symbol, normalize_instrument_id, ExchangeId};
use fb_core::model::order::{Order, OrderAction, OrderRequest};
use fb_core::split::split_close_order;
use fb_core::time::{in_trading_session, is_order_fresh};
use fb_storage::{CacheClient, DbClient};

use crate::skeleton::WorkerHandler;

/// Handle used to run async storage calls from the worker thread, which is
/// a plain `std::thread` and not itself a tokio task.
pub struct OrderSubmitter {
    portfolio_id: String,
    db: DbClient,
    cache: CacheClient,
    rt: tokio::runtime::Handle,
}

impl OrderSubmitter {
    pub fn new(
        portfolio_id: String,
        db: DbClient,
        cache: CacheClient,
        rt: tokio::runtime::Handle,
    ) -> Self {
        Self {
            portfolio_id,
            db,
            cache,
            rt,
        }
    }

    fn reject(order_id: &str, reason: &str) -> BridgeError {
        tracing::warn!(order_id, reason, "rejecting submit");
        BridgeError::ValidationReject {
            order_id: order_id.to_string(),
            reason: reason.to_string(),
        }
    }

    fn submit(&mut self, gateway: &mut dyn BrokerGateway, request: OrderRequest) -> Result<(), BridgeError> {
        let timestamp = request
            .timestamp
            .ok_or_else(|| Self::reject(&request.order_id, "missing timestamp"))?;

        let now = Utc::now();
        if !is_order_fresh(timestamp, now) {
            return Err(Self::reject(&request.order_id, "expired"));
        }
        if !in_trading_session(now) {
            return Err(Self::reject(&request.order_id, "outside trading session"));
        }

        let symbol = request
            .symbol
            .clone()
            .ok_or_else(|| Self::reject(&request.order_id, "missing symbol"))?;
        let exchange = exchange_of_symbol(&symbol).unwrap_or(ExchangeId::Mock);

        let cached_position = self
            .rt
            .block_on(self.cache.get_position(&self.portfolio_id, &symbol))
            .map_err(|e| e.into_bridge_error("position_lookup"))?;

        let children = split_close_order(&request, exchange, cached_position.as_ref());

        for child in &children {
            let child_symbol = child.symbol.as_deref().unwrap_or(&symbol);
            let instrument_id = normalize_instrument_id(child_symbol).to_string();
            let order = Order::new_alive(child, instrument_id.clone());

            self.rt
                .block_on(self.db.insert_order(&order))
                .map_err(|e| e.into_bridge_error("order_insert"))?;

            let recheck_ts = child.timestamp.unwrap_or(timestamp);
            let recheck_now = Utc::now();
            if !is_order_fresh(recheck_ts, recheck_now) || !in_trading_session(recheck_now) {
                tracing::warn!(
                    order_id = %child.order_id,
                    "second age/session check failed after insert, skipping broker submit"
                );
                continue;
            }

            gateway
                .drain(Duration::ZERO)
                .map_err(|e| BridgeError::broker_call("pre_submit_drain", e))?;
            gateway
                .insert_order(
                    &child.order_id,
                    child_symbol,
                    child.direction.expect("split child carries a direction"),
                    child.offset.expect("split child carries an offset"),
                    child.volume.unwrap_or_default(),
                    child.limit_price,
                )
                .map_err(|e| BridgeError::broker_call("insert_order", e))?;
            gateway
                .drain(Duration::ZERO)
                .map_err(|e| BridgeError::broker_call("post_submit_drain", e))?;
        }

        Ok(())
    }
}

impl WorkerHandler<OrderRequest> for OrderSubmitter {
    fn on_message(
        &mut self,
        gateway: &mut dyn BrokerGateway,
        request: OrderRequest,
    ) -> Result<(), BridgeError> {
        if request.action != OrderAction::Submit {
            tracing::warn!(order_id = %request.order_id, "submitter received a non-submit action, ignoring");
            return Ok(());
        }
        self.submit(gateway, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_broker::mock::MockGateway;
    use fb_broker::Credentials;
    use fb_core::model::order::{Direction, Offset};
    use rust_decimal_macros::dec;

    fn creds() -> Credentials {
        Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        }
    }

    fn fresh_request() -> OrderRequest {
        OrderRequest {
            action: OrderAction::Submit,
            order_id: "A".into(),
            portfolio_id: "P1".into(),
            symbol: Some("SHFE.pb2611".into()),
            direction: Some(Direction::Sell),
            offset: Some(Offset::Open),
            volume: Some(2),
            limit_price: Some(dec!(17355)),
            timestamp: Utc::now().timestamp_nanos_opt(),
            cancel_type: None,
            contract_code: None,
        }
    }

    #[test]
    fn reject_helper_produces_validation_reject() {
        let err = OrderSubmitter::reject("A", "expired");
        assert!(matches!(err, BridgeError::ValidationReject { order_id, reason } if order_id == "A" && reason == "expired"));
    }

    #[test]
    fn fresh_request_passes_the_age_check() {
        let request = fresh_request();
        assert!(is_order_fresh(request.timestamp.unwrap(), Utc::now()));
    }

    #[test]
    fn mock_gateway_accepts_a_split_child_submit() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A_close", "SHFE.pb2611", Direction::Sell, Offset::Close, 2, None)
            .unwrap();
        assert_eq!(gw.orders().len(), 1);
    }
}
