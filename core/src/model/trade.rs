//! Immutable fill records (`trade_history_futures_chn`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::{Direction, Offset};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    pub trade_id: String,
    pub order_id: String,
    pub exchange_trade_id: String,
    pub exchange_id: String,
    pub instrument_id: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: Decimal,
    pub volume: i64,
    pub commission: Decimal,
    /// Broker-assigned trade timestamp, nanoseconds since epoch.
    pub trade_date_time: i64,
    pub seqno: i64,
    pub portfolio_id: String,
}
