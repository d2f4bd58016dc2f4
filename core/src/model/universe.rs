//! A tracked product's current-main / next-main contract pair, as loaded
//! from the relational store's `product_info`/`contract_info` join.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UniverseSymbol {
    pub product_code: String,
    pub current_main_symbol: String,
    pub next_main_symbol: String,
}

impl UniverseSymbol {
    /// Both broker symbols this product currently resolves to.
    pub fn symbols(&self) -> [&str; 2] {
        [&self.current_main_symbol, &self.next_main_symbol]
    }
}
