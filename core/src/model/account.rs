//! Account snapshot cached at `TQ_Account_PortfolioId_{pid}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Account {
    pub balance: Decimal,
    pub available: Decimal,
    pub margin: Decimal,
    pub risk_ratio: Decimal,
    pub position_profit: Decimal,
}
