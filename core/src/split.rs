//! Close-today / close-historical order split for SHFE/INE-style
//! exchanges: same-day positions must be closed with a `CLOSETODAY` child
//! order, prior-day positions with a `CLOSE` child.

use crate::model::exchange::ExchangeId;
use crate::model::order::{Direction, Offset, OrderRequest};
use crate::model::position::FullPosition;

/// Splits a `CLOSE` order request against a cached position. Returns the
/// original request unchanged (as a single-element vec) unless the
/// exchange requires the split, the offset is `CLOSE`, and a cached
/// position is available.
///
/// The `CLOSETODAY` child, when present, always comes before the `CLOSE`
/// child — submission order matters because the broker applies today/his
/// accounting in the order children are submitted.
pub fn split_close_order(
    request: &OrderRequest,
    exchange: ExchangeId,
    position: Option<&FullPosition>,
) -> Vec<OrderRequest> {
    let Some(Offset::Close) = request.offset else {
        return vec![request.clone()];
    };
    if !exchange.requires_closetoday_split() {
        return vec![request.clone()];
    }
    let Some(position) = position else {
        return vec![request.clone()];
    };

    let (today_qty, his_qty) = match request.direction {
        Some(Direction::Sell) => (position.pos_long_today, position.pos_long_his),
        Some(Direction::Buy) => (position.pos_short_today, position.pos_short_his),
        None => return vec![request.clone()],
    };

    let volume = request.volume.unwrap_or(0);
    let mut remaining = volume;
    let mut children = Vec::with_capacity(2);

    if today_qty > 0 && remaining > 0 {
        let closetoday_vol = today_qty.min(remaining);
        let mut child = request.clone();
        child.offset = Some(Offset::Closetoday);
        child.volume = Some(closetoday_vol);
        child.order_id = request.closetoday_child_id();
        remaining -= closetoday_vol;
        children.push(child);
    }

    if his_qty > 0 && remaining > 0 {
        let close_vol = his_qty.min(remaining);
        let mut child = request.clone();
        child.offset = Some(Offset::Close);
        child.volume = Some(close_vol);
        child.order_id = request.close_child_id();
        children.push(child);
    }

    if children.is_empty() {
        return vec![request.clone()];
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::order::OrderAction;

    fn close_request(direction: Direction, volume: i64) -> OrderRequest {
        OrderRequest {
            action: OrderAction::Submit,
            order_id: "B".into(),
            portfolio_id: "P1".into(),
            symbol: Some("SHFE.rb2505".into()),
            direction: Some(direction),
            offset: Some(Offset::Close),
            volume: Some(volume),
            limit_price: None,
            timestamp: None,
            cancel_type: None,
            contract_code: None,
        }
    }

    #[test]
    fn splits_sell_close_against_long_breakdown() {
        let position = FullPosition::new(3, 4, 0, 0);
        let request = close_request(Direction::Sell, 5);
        let children = split_close_order(&request, ExchangeId::Shfe, Some(&position));

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].offset, Some(Offset::Closetoday));
        assert_eq!(children[0].volume, Some(3));
        assert_eq!(children[0].order_id, "B_closetoday");
        assert_eq!(children[1].offset, Some(Offset::Close));
        assert_eq!(children[1].volume, Some(2));
        assert_eq!(children[1].order_id, "B_close");

        let total: i64 = children.iter().filter_map(|c| c.volume).sum();
        assert!(total <= 5);
    }

    #[test]
    fn no_split_outside_closetoday_exchanges() {
        let position = FullPosition::new(3, 4, 0, 0);
        let request = close_request(Direction::Sell, 5);
        let children = split_close_order(&request, ExchangeId::Dce, Some(&position));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].order_id, "B");
    }

    #[test]
    fn no_cached_position_submits_unchanged() {
        let request = close_request(Direction::Sell, 5);
        let children = split_close_order(&request, ExchangeId::Shfe, None);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].order_id, "B");
    }

    #[test]
    fn buy_close_uses_short_breakdown() {
        let position = FullPosition::new(0, 0, 2, 1);
        let request = close_request(Direction::Buy, 3);
        let children = split_close_order(&request, ExchangeId::Ine, Some(&position));
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].volume, Some(2));
        assert_eq!(children[1].volume, Some(1));
    }
}
