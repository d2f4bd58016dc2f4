//! Exchange identifiers for the Chinese futures markets this bridge talks
//! to, plus the today/historical split rule those exchanges impose.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::CLOSETODAY_EXCHANGES;

/// Identifies a futures exchange.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum ExchangeId {
    /// Shanghai Futures Exchange — requires the close-today split.
    Shfe,
    /// Shanghai International Energy Exchange — requires the close-today split.
    Ine,
    /// Dalian Commodity Exchange.
    Dce,
    /// Zhengzhou Commodity Exchange.
    Czce,
    /// China Financial Futures Exchange.
    Cffex,
    /// Guangzhou Futures Exchange.
    Gfex,
    /// Mock exchange for tests.
    Mock,
}

impl ExchangeId {
    /// Returns true if orders closing a position on this exchange must be
    /// split into a `CLOSETODAY` child and a `CLOSE` child.
    pub fn requires_closetoday_split(&self) -> bool {
        CLOSETODAY_EXCHANGES.contains(&self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Shfe => "SHFE",
            ExchangeId::Ine => "INE",
            ExchangeId::Dce => "DCE",
            ExchangeId::Czce => "CZCE",
            ExchangeId::Cffex => "CFFEX",
            ExchangeId::Gfex => "GFEX",
            ExchangeId::Mock => "MOCK",
        }
    }
}

impl FromStr for ExchangeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SHFE" => Ok(ExchangeId::Shfe),
            "INE" => Ok(ExchangeId::Ine),
            "DCE" => Ok(ExchangeId::Dce),
            "CZCE" => Ok(ExchangeId::Czce),
            "CFFEX" => Ok(ExchangeId::Cffex),
            "GFEX" => Ok(ExchangeId::Gfex),
            "MOCK" => Ok(ExchangeId::Mock),
            _ => Err(()),
        }
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts the exchange prefix from a broker symbol like `SHFE.rb2505`, if
/// it follows that convention.
pub fn exchange_of_symbol(symbol: &str) -> Option<ExchangeId> {
    symbol.split('.').next().and_then(|prefix| prefix.parse().ok())
}

/// Strips the exchange prefix from a broker symbol (`SHFE.rb2505` ->
/// `rb2505`), matching the canceller's `normalize_instrument_id`.
pub fn normalize_instrument_id(symbol: &str) -> &str {
    symbol.split_once('.').map_or(symbol, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shfe_and_ine_require_the_split() {
        assert!(ExchangeId::Shfe.requires_closetoday_split());
        assert!(ExchangeId::Ine.requires_closetoday_split());
        assert!(!ExchangeId::Dce.requires_closetoday_split());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(ExchangeId::from_str("shfe").unwrap(), ExchangeId::Shfe);
        assert!(ExchangeId::from_str("nyse").is_err());
    }

    #[test]
    fn extracts_exchange_prefix() {
        assert_eq!(exchange_of_symbol("SHFE.rb2505"), Some(ExchangeId::Shfe));
        assert_eq!(normalize_instrument_id("SHFE.rb2505"), "rb2505");
        assert_eq!(normalize_instrument_id("rb2505"), "rb2505");
    }
}
