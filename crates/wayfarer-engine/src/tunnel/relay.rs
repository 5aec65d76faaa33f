use std::collections::HashMap;

/// Tombstones tolerated before a compaction, beyond the live count.
const COMPACT_SLACK: usize = 32;

/// Insertion-ordered map with O(1) insert, lookup and removal.
///
/// Removal leaves a tombstone in the ordered slot list; tombstones are
/// compacted away once they outnumber live entries, so iteration stays
/// proportional to the live count (amortized).
#[derive(Debug)]
pub struct Relay<T> {
    slots: Vec<Option<(u64, T)>>,
    index: HashMap<u64, usize>,
}

impl<T> Relay<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends `value` under `key`. An existing entry with the same key is
    /// replaced in place, keeping its position.
    pub fn insert(&mut self, key: u64, value: T) {
        if let Some(&slot) = self.index.get(&key) {
            self.slots[slot] = Some((key, value));
            return;
        }
        self.index.insert(key, self.slots.len());
        self.slots.push(Some((key, value)));
    }

    pub fn remove(&mut self, key: u64) -> Option<T> {
        let slot = self.index.remove(&key)?;
        let (_, value) = self.slots[slot].take()?;

        let tombstones = self.slots.len() - self.index.len();
        if tombstones > self.index.len() + COMPACT_SLACK {
            self.compact();
        }
        Some(value)
    }

    pub fn get(&self, key: u64) -> Option<&T> {
        let slot = *self.index.get(&key)?;
        self.slots[slot].as_ref().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut T> {
        let slot = *self.index.get(&key)?;
        self.slots[slot].as_mut().map(|(_, v)| v)
    }

    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.index.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.slots.iter().filter_map(|s| s.as_ref().map(|(k, v)| (*k, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut T)> {
        self.slots.iter_mut().filter_map(|s| s.as_mut().map(|(k, v)| (*k, v)))
    }

    pub fn keys(&self) -> Vec<u64> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Removes every entry, in insertion order.
    pub fn drain(&mut self) -> Vec<(u64, T)> {
        self.index.clear();
        std::mem::take(&mut self.slots).into_iter().flatten().collect()
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some((key, _)) = entry {
                self.index.insert(*key, slot);
            }
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Default for Relay<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order_after_removals() {
        let mut relay = Relay::new();
        for k in 1..=5 {
            relay.insert(k, k * 10);
        }
        assert_eq!(relay.remove(2), Some(20));
        assert_eq!(relay.remove(2), None);
        assert_eq!(relay.remove(4), Some(40));
        assert_eq!(relay.keys(), vec![1, 3, 5]);
        assert_eq!(relay.len(), 3);
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut relay = Relay::new();
        relay.insert(1, "a");
        relay.insert(2, "b");
        relay.insert(1, "c");
        assert_eq!(relay.iter().collect::<Vec<_>>(), vec![(1, &"c"), (2, &"b")]);
    }

    #[test]
    fn tombstones_are_compacted() {
        let mut relay = Relay::new();
        for k in 0..200 {
            relay.insert(k, ());
        }
        for k in 0..190 {
            relay.remove(k);
        }
        assert!(relay.slot_count() <= relay.len() * 2 + COMPACT_SLACK + 1);
        assert_eq!(relay.keys(), (190..200).collect::<Vec<_>>());
        assert!(relay.get(195).is_some());
        assert!(relay.get(5).is_none());
    }
}
