//! Order request and order lifecycle entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Offset {
    Open,
    Close,
    Closetoday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Submit,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelType {
    OrderId,
    ContractCode,
    All,
}

/// An inbound command consumed from `external.orders`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderRequest {
    pub action: OrderAction,
    pub order_id: String,
    pub portfolio_id: String,

    // SUBMIT fields.
    pub symbol: Option<String>,
    pub direction: Option<Direction>,
    pub offset: Option<Offset>,
    pub volume: Option<i64>,
    pub limit_price: Option<Decimal>,
    /// Nanoseconds since epoch.
    pub timestamp: Option<i64>,

    // CANCEL fields.
    pub cancel_type: Option<CancelType>,
    pub contract_code: Option<String>,
}

impl OrderRequest {
    /// Derives the `order_id` for the `CLOSETODAY` child produced by the
    /// position split.
    pub fn closetoday_child_id(&self) -> String {
        format!("{}_closetoday", self.order_id)
    }

    /// Derives the `order_id` for the `CLOSE` child produced by the
    /// position split.
    pub fn close_child_id(&self) -> String {
        format!("{}_close", self.order_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Alive,
    Finished,
}

/// Event types a monitor derives from comparing successive order snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum OrderEventType {
    New,
    PartialFill,
    CompleteFill,
    Canceled,
}

/// Classifies an order snapshot per the monitor's event table.
pub fn classify_order_event(
    status: OrderStatus,
    volume_orign: i64,
    volume_left: i64,
) -> OrderEventType {
    match (status, volume_left) {
        (OrderStatus::Alive, left) if left == volume_orign => OrderEventType::New,
        (OrderStatus::Alive, _) => OrderEventType::PartialFill,
        (OrderStatus::Finished, 0) => OrderEventType::CompleteFill,
        (OrderStatus::Finished, _) => OrderEventType::Canceled,
    }
}

/// The persisted order-lifecycle row (`order_history_futures_chn`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    // Immutable on create.
    pub order_id: String,
    pub instrument_id: String,
    pub direction: Direction,
    pub offset: Offset,
    pub volume_orign: i64,
    pub limit_price: Option<Decimal>,
    pub portfolio_id: String,
    pub origin_timestamp: i64,

    // Mutable across life.
    pub exchange_order_id: String,
    pub exchange_id: String,
    pub volume_left: i64,
    pub last_msg: String,
    pub status: OrderStatus,
    pub is_dead: bool,
    pub is_online: bool,
    pub is_error: bool,
    pub trade_price: Decimal,
    pub exchange_trading_date: String,

    /// Fills observed for this order so far. The order handler appends new
    /// entries to the `trades` table, deduping by `trade_id`.
    pub trades: Vec<super::trade::Trade>,
}

impl Order {
    pub fn new_alive(request: &OrderRequest, instrument_id: String) -> Self {
        let volume = request.volume.unwrap_or_default();
        Self {
            order_id: request.order_id.clone(),
            instrument_id,
            direction: request.direction.expect("submit request carries a direction"),
            offset: request.offset.expect("submit request carries an offset"),
            volume_orign: volume,
            limit_price: request.limit_price,
            portfolio_id: request.portfolio_id.clone(),
            origin_timestamp: request.timestamp.unwrap_or_default(),
            exchange_order_id: String::new(),
            exchange_id: String::new(),
            volume_left: volume,
            last_msg: String::new(),
            status: OrderStatus::Alive,
            is_dead: false,
            is_online: false,
            is_error: false,
            trade_price: Decimal::ZERO,
            exchange_trading_date: String::new(),
            trades: Vec::new(),
        }
    }

    pub fn event_type(&self) -> OrderEventType {
        classify_order_event(self.status, self.volume_orign, self.volume_left)
    }
}

/// Field-wise projection of an `Order` the order monitor diffs between
/// drains. Intentionally narrower than `Order` — see snapshot-diff design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub status: OrderStatus,
    pub volume_left: i64,
    pub volume_orign: i64,
    pub exchange_order_id: String,
    pub exchange_id: String,
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status,
            volume_left: order.volume_left,
            volume_orign: order.volume_orign,
            exchange_order_id: order.exchange_order_id.clone(),
            exchange_id: order.exchange_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_new_order() {
        assert_eq!(
            classify_order_event(OrderStatus::Alive, 2, 2),
            OrderEventType::New
        );
    }

    #[test]
    fn classifies_partial_fill() {
        assert_eq!(
            classify_order_event(OrderStatus::Alive, 2, 1),
            OrderEventType::PartialFill
        );
    }

    #[test]
    fn classifies_complete_fill_and_cancel() {
        assert_eq!(
            classify_order_event(OrderStatus::Finished, 2, 0),
            OrderEventType::CompleteFill
        );
        assert_eq!(
            classify_order_event(OrderStatus::Finished, 2, 1),
            OrderEventType::Canceled
        );
    }

    #[test]
    fn child_ids_carry_the_suffix() {
        let req = OrderRequest {
            action: OrderAction::Submit,
            order_id: "B".into(),
            portfolio_id: "P1".into(),
            symbol: Some("SHFE.rb2505".into()),
            direction: Some(Direction::Sell),
            offset: Some(Offset::Close),
            volume: Some(5),
            limit_price: None,
            timestamp: None,
            cancel_type: None,
            contract_code: None,
        };
        assert_eq!(req.closetoday_child_id(), "B_closetoday");
        assert_eq!(req.close_child_id(), "B_close");
    }
}
