//! Fixed-capacity ring storage shared by both buffer strategies.
//!
//! The ring itself is not synchronized; each strategy wraps it in its own lock.

use crate::types::Item;

pub struct Ring {
    slots: Vec<Option<Item>>,
    head: usize,
    tail: usize,
    count: usize,
    high_water: usize,
}

impl Ring {
    /// Callers guarantee `capacity > 0`.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring capacity must be > 0");
        Self {
            slots: vec![None; capacity],
            head: 0,
            tail: 0,
            count: 0,
            high_water: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Highest occupancy observed since construction.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Store at `tail`. The caller must have established `!is_full()`.
    pub fn push(&mut self, item: Item) {
        debug_assert!(!self.is_full(), "push into full ring");
        let slot = &mut self.slots[self.tail];
        debug_assert!(slot.is_none(), "overwriting unread slot {}", self.tail);
        *slot = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        self.high_water = self.high_water.max(self.count);
    }

    /// Take from `head`, or `None` when empty.
    pub fn pop(&mut self) -> Option<Item> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        debug_assert!(item.is_some(), "occupied slot {} was empty", self.head);
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around_in_fifo_order() {
        let mut ring = Ring::new(3);
        for round in 0..4u64 {
            let base = round * 10;
            ring.push(Item::new(base));
            ring.push(Item::new(base + 1));
            assert_eq!(ring.pop(), Some(Item::new(base)));
            ring.push(Item::new(base + 2));
            assert_eq!(ring.pop(), Some(Item::new(base + 1)));
            assert_eq!(ring.pop(), Some(Item::new(base + 2)));
            assert!(ring.is_empty());
        }
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn tracks_count_and_high_water() {
        let mut ring = Ring::new(2);
        assert_eq!(ring.capacity(), 2);
        ring.push(Item::new(1));
        ring.push(Item::new(2));
        assert!(ring.is_full());
        assert_eq!(ring.len(), 2);
        ring.pop();
        ring.pop();
        ring.push(Item::new(3));
        // High-water mark keeps the peak, not the current count.
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.high_water(), 2);
    }
}
