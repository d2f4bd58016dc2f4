//! Exchange, queue, and routing-key names. Every service binds against
//! this fixed topology rather than inventing its own names.

/// Upstream publishes SUBMIT/CANCEL commands here. Topic exchange, bound
/// per-portfolio with routing key [`portfolio_routing_key`].
pub const ORDERS_EXCHANGE: &str = "external.orders";

/// Monitors publish lifecycle events here for the bridge's own handlers.
/// Direct exchange, one routing key per event kind.
pub const EVENTS_EXCHANGE: &str = "internal.events";

pub const ORDER_SUBMIT_QUEUE: &str = "tq_order_submit_requests";
pub const ORDER_CANCEL_QUEUE: &str = "tq_order_cancel_requests";

pub const ORDER_UPDATES_ROUTING_KEY: &str = "order_updates";
pub const ACCOUNT_UPDATES_ROUTING_KEY: &str = "account_updates";
pub const POSITION_UPDATES_ROUTING_KEY: &str = "position_updates";

pub const ORDER_UPDATES_QUEUE: &str = "tq_internal_order_updates";
pub const ACCOUNT_UPDATES_QUEUE: &str = "tq_internal_account_updates";
pub const POSITION_UPDATES_QUEUE: &str = "tq_internal_position_updates";

/// The routing key upstream order commands are published and bound with.
pub fn portfolio_routing_key(portfolio_id: &str) -> String {
    format!("PortfolioId_{portfolio_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_routing_key_matches_upstream_convention() {
        assert_eq!(portfolio_routing_key("P1"), "PortfolioId_P1");
    }
}
