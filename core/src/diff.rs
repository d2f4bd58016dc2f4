//! Generic snapshot-diff change detector.
//!
//! The broker gateway exposes its world as live dictionaries mutated in
//! place by `drain()`; monitors do not receive events, they compute them by
//! comparing successive immutable projections against a previous-snapshot
//! map.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent<K, V> {
    Create { key: K, value: V },
    Update { key: K, value: V },
    /// Emitted for a key present last tick but absent from the current live
    /// view (position monitor only — orders never disappear).
    Closed { key: K },
}

/// Owns the previous-snapshot map for one monitor loop and produces
/// create/update/closed events by comparing it against the current live
/// view on every call to [`SnapshotDiffer::diff`].
#[derive(Debug, Default)]
pub struct SnapshotDiffer<K, V> {
    previous: HashMap<K, V>,
}

impl<K, V> SnapshotDiffer<K, V>
where
    K: Eq + Hash + Clone,
    V: PartialEq + Clone,
{
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
        }
    }

    /// Diffs `current` against the stored previous snapshot, then replaces
    /// the previous snapshot with `current`.
    ///
    /// `current` must contain every key the live view has *this* tick;
    /// entries in the previous map missing from `current` emit
    /// [`DiffEvent::Closed`] — callers that don't track disappearance
    /// (orders) should use [`Self::diff_no_close`] instead.
    pub fn diff(&mut self, current: HashMap<K, V>) -> Vec<DiffEvent<K, V>> {
        let mut events = Vec::new();

        for (key, value) in &current {
            match self.previous.get(key) {
                None => events.push(DiffEvent::Create {
                    key: key.clone(),
                    value: value.clone(),
                }),
                Some(prev) if prev != value => events.push(DiffEvent::Update {
                    key: key.clone(),
                    value: value.clone(),
                }),
                Some(_) => {}
            }
        }

        for key in self.previous.keys() {
            if !current.contains_key(key) {
                events.push(DiffEvent::Closed { key: key.clone() });
            }
        }

        self.previous = current;
        events
    }

    /// Like [`Self::diff`], but never emits [`DiffEvent::Closed`] — orders
    /// never disappear from the live view, so the order monitor uses this
    /// variant.
    pub fn diff_no_close(&mut self, current: HashMap<K, V>) -> Vec<DiffEvent<K, V>> {
        self.diff(current)
            .into_iter()
            .filter(|e| !matches!(e, DiffEvent::Closed { .. }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_all_creates() {
        let mut differ: SnapshotDiffer<&str, i32> = SnapshotDiffer::new();
        let mut current = HashMap::new();
        current.insert("a", 1);
        let events = differ.diff(current);
        assert_eq!(events, vec![DiffEvent::Create { key: "a", value: 1 }]);
    }

    #[test]
    fn unequal_value_is_update_equal_value_is_silent() {
        let mut differ: SnapshotDiffer<&str, i32> = SnapshotDiffer::new();
        let mut first = HashMap::new();
        first.insert("a", 1);
        differ.diff(first);

        let mut second = HashMap::new();
        second.insert("a", 2);
        assert_eq!(
            differ.diff(second.clone()),
            vec![DiffEvent::Update { key: "a", value: 2 }]
        );

        assert_eq!(differ.diff(second), vec![]);
    }

    #[test]
    fn disappearing_key_emits_closed() {
        let mut differ: SnapshotDiffer<&str, i32> = SnapshotDiffer::new();
        let mut first = HashMap::new();
        first.insert("a", 1);
        differ.diff(first);

        let events = differ.diff(HashMap::new());
        assert_eq!(events, vec![DiffEvent::Closed { key: "a" }]);
    }
}
