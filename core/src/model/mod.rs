//! Entity models shared by every service: orders, trades, positions,
//! account snapshots, exchange identifiers and the universe of tradable
//! symbols.

pub mod account;
pub mod events;
pub mod exchange;
pub mod order;
pub mod position;
pub mod trade;
pub mod universe;

pub use account::Account;
pub use exchange::ExchangeId;
pub use order::{Direction, Offset, Order, OrderRequest, OrderStatus};
pub use position::FullPosition;
pub use trade::Trade;
pub use universe::UniverseSymbol;
