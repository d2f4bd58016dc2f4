//! Envelope types published to the `internal.events` direct exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::order::{Order, OrderEventType};
use super::position::FullPosition;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderUpdate {
    pub timestamp: DateTime<Utc>,
    pub portfolio_id: String,
    pub event_type: OrderEventType,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionUpdate {
    pub timestamp: DateTime<Utc>,
    pub portfolio_id: String,
    pub symbol: String,
    pub position: FullPosition,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccountUpdate {
    pub timestamp: DateTime<Utc>,
    pub portfolio_id: String,
    pub account: Account,
}
