//! Seven-field position snapshot, authoritative per the spec's resolution
//! of the duplicate scalar/breakdown cache schemas in the original source.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FullPosition {
    pub pos_long: i64,
    pub pos_short: i64,
    pub pos: i64,
    pub pos_long_today: i64,
    pub pos_long_his: i64,
    pub pos_short_today: i64,
    pub pos_short_his: i64,
}

impl FullPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// True when both long/short breakdowns and the net position are
    /// internally consistent — `pos_long = today + his`, `pos = long - short`.
    pub fn is_consistent(&self) -> bool {
        self.pos_long == self.pos_long_today + self.pos_long_his
            && self.pos_short == self.pos_short_today + self.pos_short_his
            && self.pos == self.pos_long - self.pos_short
    }

    pub fn new(
        pos_long_today: i64,
        pos_long_his: i64,
        pos_short_today: i64,
        pos_short_his: i64,
    ) -> Self {
        let pos_long = pos_long_today + pos_long_his;
        let pos_short = pos_short_today + pos_short_his;
        Self {
            pos_long,
            pos_short,
            pos: pos_long - pos_short,
            pos_long_today,
            pos_long_his,
            pos_short_today,
            pos_short_his,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_position_is_consistent() {
        assert!(FullPosition::zero().is_consistent());
    }

    #[test]
    fn constructed_position_derives_totals() {
        let pos = FullPosition::new(3, 4, 0, 0);
        assert_eq!(pos.pos_long, 7);
        assert_eq!(pos.pos, 7);
        assert!(pos.is_consistent());
    }

    #[test]
    fn json_round_trip_is_identity() {
        let pos = FullPosition::new(3, 4, 1, 2);
        let json = serde_json::to_string(&pos).unwrap();
        let back: FullPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(pos, back);
    }
}
