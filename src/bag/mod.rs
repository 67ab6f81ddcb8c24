//! Priority-weighted probabilistic bag.
//!
//! Unlike a priority queue, a bag never guarantees the highest-priority
//! item is picked next: it samples an item with probability proportional
//! to priority, so low-priority items are merely unlikely to be chosen,
//! never starved outright (spec.md §3/§4.7 — AIKR's "every item gets a
//! chance" requirement). Items are keyed so a concept already in the bag
//! can have its priority updated in place instead of being duplicated.

use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hash::Hash;

/// An item a [`Bag`] can rank and sample.
pub trait BagItem: Clone {
    type Key: Eq + Hash + Clone;
    fn key(&self) -> Self::Key;
    fn priority(&self) -> f32;
}

/// A fixed-capacity, priority-weighted sampling structure.
pub struct Bag<T: BagItem> {
    items: IndexMap<T::Key, T>,
    capacity: usize,
    rng: StdRng,
}

impl<T: BagItem> Bag<T> {
    pub fn new(capacity: usize) -> Self {
        Bag {
            items: IndexMap::with_capacity(capacity),
            capacity,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Bag {
            items: IndexMap::with_capacity(capacity),
            capacity,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.contains_key(key)
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.items.swap_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Iterate with mutable access, for in-place attention decay — unlike
    /// `take`/`sample_key`, this never removes anything.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    /// Insert or update an item. If the bag is at capacity and `item` is a
    /// new key, the current lowest-priority item is evicted to make room
    /// and returned so the caller can emit a `CapacityEvicted` event. A
    /// `None` return with the item accepted means no eviction happened.
    pub fn put(&mut self, item: T) -> Option<T> {
        let key = item.key();
        if self.items.contains_key(&key) {
            self.items.insert(key, item);
            return None;
        }
        if self.items.len() < self.capacity {
            self.items.insert(key, item);
            return None;
        }
        let evict_key = self
            .items
            .iter()
            .min_by(|a, b| a.1.priority().partial_cmp(&b.1.priority()).unwrap())
            .map(|(k, _)| k.clone());
        match evict_key {
            Some(evict_key) if self.items[&evict_key].priority() < item.priority() => {
                let evicted = self.items.swap_remove(&evict_key);
                self.items.insert(key, item);
                evicted
            }
            _ => Some(item),
        }
    }

    /// Sample one item with probability proportional to priority, removing
    /// it from the bag. `None` if the bag is empty or every priority is
    /// zero (nothing worth sampling).
    pub fn take(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let weights: Vec<f32> = self.items.values().map(|t| t.priority().max(1e-6)).collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        let idx = dist.sample(&mut self.rng);
        let (_, item) = self.items.swap_remove_index(idx)?;
        Some(item)
    }

    /// Sample one item's key without removing it, for read-only attention
    /// sampling (e.g. the scheduler picking a concept to process while
    /// leaving it available for the next cycle too).
    pub fn sample_key(&mut self) -> Option<T::Key> {
        if self.items.is_empty() {
            return None;
        }
        let weights: Vec<f32> = self.items.values().map(|t| t.priority().max(1e-6)).collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        let idx = dist.sample(&mut self.rng);
        self.items.get_index(idx).map(|(k, _)| k.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        key: u32,
        priority: f32,
    }

    impl BagItem for Item {
        type Key = u32;
        fn key(&self) -> u32 {
            self.key
        }
        fn priority(&self) -> f32 {
            self.priority
        }
    }

    #[test]
    fn put_and_get() {
        let mut bag: Bag<Item> = Bag::new(4);
        bag.put(Item { key: 1, priority: 0.5 });
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get(&1).unwrap().priority, 0.5);
    }

    #[test]
    fn put_updates_existing_key_without_growing() {
        let mut bag: Bag<Item> = Bag::new(4);
        bag.put(Item { key: 1, priority: 0.5 });
        bag.put(Item { key: 1, priority: 0.9 });
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get(&1).unwrap().priority, 0.9);
    }

    #[test]
    fn eviction_at_capacity_drops_lowest_priority() {
        let mut bag: Bag<Item> = Bag::with_seed(2, 7);
        bag.put(Item { key: 1, priority: 0.1 });
        bag.put(Item { key: 2, priority: 0.2 });
        let evicted = bag.put(Item { key: 3, priority: 0.9 });
        assert_eq!(evicted.map(|i| i.key), Some(1));
        assert_eq!(bag.len(), 2);
        assert!(bag.contains(&2));
        assert!(bag.contains(&3));
    }

    #[test]
    fn low_priority_item_is_rejected_when_bag_is_full_of_higher_priority() {
        let mut bag: Bag<Item> = Bag::with_seed(2, 7);
        bag.put(Item { key: 1, priority: 0.8 });
        bag.put(Item { key: 2, priority: 0.9 });
        let rejected = bag.put(Item { key: 3, priority: 0.1 });
        assert_eq!(rejected.map(|i| i.key), Some(3));
        assert!(!bag.contains(&3));
    }

    #[test]
    fn take_empties_bag_over_time() {
        let mut bag: Bag<Item> = Bag::with_seed(4, 1);
        bag.put(Item { key: 1, priority: 0.5 });
        bag.put(Item { key: 2, priority: 0.5 });
        assert!(bag.take().is_some());
        assert!(bag.take().is_some());
        assert!(bag.take().is_none());
    }

    #[test]
    fn higher_priority_items_are_sampled_more_often() {
        let mut bag: Bag<Item> = Bag::with_seed(2, 42);
        bag.put(Item { key: 1, priority: 0.95 });
        bag.put(Item { key: 2, priority: 0.05 });
        let mut hi_count = 0;
        for _ in 0..200 {
            if let Some(k) = bag.sample_key() {
                if k == 1 {
                    hi_count += 1;
                }
            }
        }
        assert!(hi_count > 150, "expected high-priority item to dominate sampling, got {hi_count}/200");
    }
}
