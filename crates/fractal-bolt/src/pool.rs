//! Fixed-capacity record arenas
//!
//! Records are addressed by index and recycled by rewinding a cursor, so a
//! frame never allocates once the pools exist.

use std::ops::{Index, IndexMut};

/// Pre-allocated arena handing out slots in order until [`reset`](Pool::reset)
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<T>,
    len: usize,
}

impl<T: Default + Clone> Pool<T> {
    /// Allocate `capacity` default records up front
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity],
            len: 0,
        }
    }
}

impl<T> Pool<T> {
    /// Claim the next slot, storing `record` in it
    ///
    /// Returns `None` once the pool is exhausted; the record is dropped.
    pub fn alloc(&mut self, record: T) -> Option<usize> {
        let slot = self.slots.get_mut(self.len)?;
        *slot = record;
        self.len += 1;
        Some(self.len - 1)
    }

    /// Forget all live records; slots are overwritten on the next `alloc`
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no record is live
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True when the next `alloc` would fail
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Live records in allocation order
    pub fn live(&self) -> &[T] {
        &self.slots[..self.len]
    }
}

impl<T> Index<usize> for Pool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        debug_assert!(index < self.len, "pool index {index} is not live");
        &self.slots[index]
    }
}

impl<T> IndexMut<usize> for Pool<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len, "pool index {index} is not live");
        &mut self.slots[index]
    }
}
