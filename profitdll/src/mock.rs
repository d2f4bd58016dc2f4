//! Mock broker gateway. Default backend, and the test double every
//! service-level test drives: push broker-side state changes between
//! `drain()` calls without a real gateway.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use fb_core::model::order::{Direction, Offset};
use fb_core::model::{Account, FullPosition, Order};
use rust_decimal::Decimal;

use crate::api::{BrokerGateway, Credentials, DrainOutcome};
use crate::error::BrokerError;

/// A queued mutation a test applies to simulate the broker advancing
/// between drain calls.
enum PendingEvent {
    Order(Order),
    Position(String, FullPosition),
    Account(Account),
}

pub struct MockGateway {
    #[allow(dead_code)]
    credentials: Credentials,
    orders: HashMap<String, Order>,
    positions: HashMap<String, FullPosition>,
    account: Account,
    queue: VecDeque<PendingEvent>,
    /// Caps how long a drain with an empty queue "blocks" for, so tests
    /// don't actually wait out a 10s deadline.
    max_idle_sleep: Duration,
}

impl MockGateway {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            orders: HashMap::new(),
            positions: HashMap::new(),
            account: Account::default(),
            queue: VecDeque::new(),
            max_idle_sleep: Duration::from_millis(20),
        }
    }

    /// Simulates the broker creating or updating an order. Queued until
    /// the next `drain()`.
    pub fn push_order(&mut self, order: Order) {
        self.queue.push_back(PendingEvent::Order(order));
    }

    /// Simulates a fill landing on an already-known order. Panics if the
    /// order hasn't been pushed yet — tests should `push_order` first.
    pub fn push_trade(&mut self, order_id: &str, trade: fb_core::model::trade::Trade) {
        let mut order = self
            .orders
            .get(order_id)
            .cloned()
            .unwrap_or_else(|| panic!("push_trade: unknown order {order_id}"));
        order.trades.push(trade);
        self.queue.push_back(PendingEvent::Order(order));
    }

    pub fn set_position(&mut self, symbol: &str, position: FullPosition) {
        self.queue
            .push_back(PendingEvent::Position(symbol.to_string(), position));
    }

    pub fn set_account(&mut self, account: Account) {
        self.queue.push_back(PendingEvent::Account(account));
    }

    /// Lets tests seed the broker's live dictionaries without going
    /// through `drain()`, e.g. to arrange the starting position before a
    /// submit pipeline test runs.
    pub fn seed_position(&mut self, symbol: &str, position: FullPosition) {
        self.positions.insert(symbol.to_string(), position);
    }
}

impl BrokerGateway for MockGateway {
    fn drain(&mut self, deadline: Duration) -> Result<DrainOutcome, BrokerError> {
        if let Some(event) = self.queue.pop_front() {
            match event {
                PendingEvent::Order(order) => {
                    self.orders.insert(order.order_id.clone(), order);
                }
                PendingEvent::Position(symbol, position) => {
                    self.positions.insert(symbol, position);
                }
                PendingEvent::Account(account) => {
                    self.account = account;
                }
            }
            return Ok(DrainOutcome {
                observed_event: true,
            });
        }

        std::thread::sleep(deadline.min(self.max_idle_sleep));
        Ok(DrainOutcome {
            observed_event: false,
        })
    }

    fn orders(&self) -> &HashMap<String, Order> {
        &self.orders
    }

    fn positions(&self) -> &HashMap<String, FullPosition> {
        &self.positions
    }

    fn account(&self) -> &Account {
        &self.account
    }

    fn insert_order(
        &mut self,
        order_id: &str,
        symbol: &str,
        direction: Direction,
        offset: Offset,
        volume: i64,
        limit_price: Option<Decimal>,
    ) -> Result<(), BrokerError> {
        let order = Order {
            order_id: order_id.to_string(),
            instrument_id: symbol.to_string(),
            direction,
            offset,
            volume_orign: volume,
            limit_price,
            portfolio_id: String::new(),
            origin_timestamp: 0,
            exchange_order_id: String::new(),
            exchange_id: fb_core::model::exchange::exchange_of_symbol(symbol)
                .map(|e| e.to_string())
                .unwrap_or_default(),
            volume_left: volume,
            last_msg: String::new(),
            status: fb_core::model::order::OrderStatus::Alive,
            is_dead: false,
            is_online: true,
            is_error: false,
            trade_price: Decimal::ZERO,
            exchange_trading_date: String::new(),
            trades: Vec::new(),
        };
        self.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    fn cancel_order(&mut self, order_id: &str) -> Result<(), BrokerError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))?;
        order.status = fb_core::model::order::OrderStatus::Finished;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        }
    }

    #[test]
    fn insert_order_populates_live_view() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.pb2611", Direction::Sell, Offset::Open, 2, None)
            .unwrap();
        assert_eq!(gw.orders().len(), 1);
        assert_eq!(gw.orders()["A"].volume_left, 2);
    }

    #[test]
    fn drain_applies_one_queued_event_per_call() {
        let mut gw = MockGateway::new(creds());
        gw.set_position("SHFE.rb2505", FullPosition::new(3, 4, 0, 0));
        gw.set_account(Account {
            balance: Decimal::from(1000),
            ..Default::default()
        });

        let first = gw.drain(Duration::from_secs(10)).unwrap();
        assert!(first.observed_event);
        assert_eq!(gw.positions().len(), 1);
        assert_eq!(gw.account().balance, Decimal::ZERO);

        let second = gw.drain(Duration::from_secs(10)).unwrap();
        assert!(second.observed_event);
        assert_eq!(gw.account().balance, Decimal::from(1000));

        let third = gw.drain(Duration::from_secs(10)).unwrap();
        assert!(!third.observed_event);
    }

    #[test]
    fn cancel_order_transitions_to_finished() {
        let mut gw = MockGateway::new(creds());
        gw.insert_order("A", "SHFE.pb2611", Direction::Sell, Offset::Open, 2, None)
            .unwrap();
        gw.cancel_order("A").unwrap();
        assert_eq!(
            gw.orders()["A"].status,
            fb_core::model::order::OrderStatus::Finished
        );
    }

    #[test]
    fn cancel_unknown_order_errors() {
        let mut gw = MockGateway::new(creds());
        assert!(matches!(
            gw.cancel_order("nope"),
            Err(BrokerError::OrderNotFound(_))
        ));
    }
}
