//! # Growable circular queue.
//!
//! [`GrowableRing`] is a FIFO over a slot arena addressed by `start`/`end`
//! cursors modulo the current capacity. It starts small, doubles on demand and
//! stops growing at a fixed ceiling.
//!
//! ## Growth
//! ```text
//! full, start != 0 (head segment wrapped to the front):
//!
//!   before  [ e f g | a b c d ]            start=3, end=3, cap=7
//!                     ^start
//!   grow    [ e f g | _ _ _ _ _ _ _ | a b c d ]   cap=14, added=7
//!   after   start = 3 + 7 = 10, end = 3
//! ```
//! Only the tail segment (`start..old_cap`) is relocated to the back of the
//! enlarged arena; the head segment (`0..end`) stays where it is. When `start`
//! is `0` nothing moves and `end` becomes the old capacity.
//!
//! ## Rules
//! - `len <= capacity <= ceiling`
//! - capacity only grows (doubling, clamped to the ceiling), never shrinks
//! - a push into a full ring at the ceiling is **rejected**: the newest item is
//!   dropped and everything already queued is kept

use std::collections::TryReserveError;

/// Result of a [`GrowableRing::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Stored without resizing.
    Stored,
    /// The ring grew before storing the item.
    Grown {
        /// Capacity before growth.
        from: usize,
        /// Capacity after growth.
        to: usize,
    },
    /// The ring is full at its ceiling; the item was dropped.
    Rejected,
}

/// Bounded, growable FIFO of `T`.
///
/// # Example
/// ```
/// use udpcast::queue::{GrowableRing, PushOutcome};
///
/// let mut ring = GrowableRing::new(2, 4);
/// assert_eq!(ring.push('a').unwrap(), PushOutcome::Stored);
/// assert_eq!(ring.push('b').unwrap(), PushOutcome::Stored);
/// assert_eq!(ring.push('c').unwrap(), PushOutcome::Grown { from: 2, to: 4 });
/// assert_eq!(ring.pop(), Some('a'));
/// ```
#[derive(Debug)]
pub struct GrowableRing<T> {
    slots: Vec<Option<T>>,
    start: usize,
    end: usize,
    len: usize,
    ceiling: usize,
}

impl<T> GrowableRing<T> {
    /// Creates an empty ring.
    ///
    /// `ceiling` is clamped to at least 1 and `initial` to `1..=ceiling`.
    ///
    /// # Panics
    /// Only if the allocator aborts; use [`try_new`](Self::try_new) to observe
    /// allocation failure.
    #[must_use]
    pub fn new(initial: usize, ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        let initial = initial.clamp(1, ceiling);
        let mut slots = Vec::with_capacity(initial);
        slots.resize_with(initial, || None);
        Self {
            slots,
            start: 0,
            end: 0,
            len: 0,
            ceiling,
        }
    }

    /// Fallible variant of [`new`](Self::new).
    pub fn try_new(initial: usize, ceiling: usize) -> Result<Self, TryReserveError> {
        let ceiling = ceiling.max(1);
        let initial = initial.clamp(1, ceiling);
        let mut slots = Vec::new();
        slots.try_reserve_exact(initial)?;
        slots.resize_with(initial, || None);
        Ok(Self {
            slots,
            start: 0,
            end: 0,
            len: 0,
            ceiling,
        })
    }

    /// Appends `item` at the back, growing if needed.
    ///
    /// Returns `Err` only if growth could not allocate; the item is dropped in
    /// that case and the ring is left unchanged.
    pub fn push(&mut self, item: T) -> Result<PushOutcome, TryReserveError> {
        let mut outcome = PushOutcome::Stored;

        if self.len == self.capacity() {
            if self.capacity() >= self.ceiling {
                return Ok(PushOutcome::Rejected);
            }
            let from = self.capacity();
            self.grow()?;
            outcome = PushOutcome::Grown {
                from,
                to: self.capacity(),
            };
        }

        debug_assert!(self.slots[self.end].is_none());
        self.slots[self.end] = Some(item);
        self.end = (self.end + 1) % self.capacity();
        self.len += 1;
        Ok(outcome)
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.start].take();
        self.start = (self.start + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Returns the oldest item without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.start].as_ref()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(self.start + i) % cap].as_ref())
    }

    /// Drops every queued item and returns how many there were.
    ///
    /// Capacity is kept.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len;
        while self.pop().is_some() {}
        self.start = 0;
        self.end = 0;
        dropped
    }

    /// Number of queued items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slot count.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Maximum slot count.
    #[inline]
    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// True if the ring is full and may not grow any further.
    #[inline]
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.len == self.ceiling
    }

    /// Doubles capacity (clamped to the ceiling) and restores a contiguous
    /// arrival order. Must only be called on a full ring.
    fn grow(&mut self) -> Result<(), TryReserveError> {
        debug_assert_eq!(self.len, self.capacity());

        let old = self.capacity();
        let new = old.saturating_mul(2).min(self.ceiling);
        let added = new - old;

        self.slots.try_reserve_exact(added)?;
        self.slots.resize_with(new, || None);

        if self.start == 0 {
            self.end = old;
        } else {
            for i in (self.start..old).rev() {
                self.slots.swap(i, i + added);
            }
            self.start += added;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T>(ring: &mut GrowableRing<T>) -> Vec<T> {
        std::iter::from_fn(|| ring.pop()).collect()
    }

    #[test]
    fn test_fifo_without_growth() {
        let mut ring = GrowableRing::new(4, 4);
        for i in 0..4 {
            assert_eq!(ring.push(i).unwrap(), PushOutcome::Stored);
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(drain(&mut ring), vec![0, 1, 2, 3]);
        assert!(ring.is_empty());
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_growth_from_aligned_start() {
        let mut ring = GrowableRing::new(2, 8);
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        assert_eq!(ring.push(3).unwrap(), PushOutcome::Grown { from: 2, to: 4 });
        ring.push(4).unwrap();
        assert_eq!(ring.push(5).unwrap(), PushOutcome::Grown { from: 4, to: 8 });
        assert_eq!(drain(&mut ring), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_growth_preserves_order_with_offset_start() {
        let mut ring = GrowableRing::new(4, 16);
        for i in 0..4 {
            ring.push(i).unwrap();
        }
        // Move `start` off zero, then wrap `end` around the front.
        assert_eq!(ring.pop(), Some(0));
        assert_eq!(ring.pop(), Some(1));
        ring.push(4).unwrap();
        ring.push(5).unwrap();
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.start, 2);

        // capacity + 1 items total forces one resize with a wrapped layout.
        assert_eq!(ring.push(6).unwrap(), PushOutcome::Grown { from: 4, to: 8 });
        assert_eq!(ring.start, 6);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);

        ring.push(7).unwrap();
        ring.push(8).unwrap();
        ring.push(9).unwrap();
        assert_eq!(drain(&mut ring), vec![2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_repeated_wraps_and_growth_keep_order() {
        let mut ring = GrowableRing::new(3, 64);
        let mut next_in = 0u32;
        let mut next_out = 0u32;

        for round in 0..50 {
            for _ in 0..(round % 5 + 2) {
                if ring.push(next_in).unwrap() != PushOutcome::Rejected {
                    next_in += 1;
                }
            }
            for _ in 0..(round % 3 + 1) {
                if let Some(v) = ring.pop() {
                    assert_eq!(v, next_out);
                    next_out += 1;
                }
            }
        }
        for v in drain(&mut ring) {
            assert_eq!(v, next_out);
            next_out += 1;
        }
        assert_eq!(next_in, next_out);
    }

    #[test]
    fn test_ceiling_drops_newest_keeps_oldest() {
        const K: usize = 8;
        let mut ring = GrowableRing::new(2, K);
        let mut rejected = 0;
        for i in 0..(K + 5) {
            if ring.push(i).unwrap() == PushOutcome::Rejected {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 5);
        assert!(ring.is_saturated());
        assert_eq!(drain(&mut ring), (0..K).collect::<Vec<_>>());
    }

    #[test]
    fn test_growth_clamps_to_uneven_ceiling() {
        let mut ring = GrowableRing::new(3, 10);
        let mut grown = Vec::new();
        for i in 0..12 {
            if let PushOutcome::Grown { from, to } = ring.push(i).unwrap() {
                grown.push((from, to));
            }
        }
        assert_eq!(grown, vec![(3, 6), (6, 10)]);
        assert_eq!(ring.capacity(), 10);
        assert_eq!(ring.len(), 10);
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let mut ring = GrowableRing::new(1, 8);
        for i in 0..5 {
            ring.push(i).unwrap();
        }
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.clear(), 5);
        assert_eq!(ring.capacity(), 8);
        assert!(ring.is_empty());

        ring.push(42).unwrap();
        assert_eq!(ring.front(), Some(&42));
    }

    #[test]
    fn test_constructor_clamps() {
        let ring: GrowableRing<u8> = GrowableRing::new(0, 0);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.ceiling(), 1);

        let ring: GrowableRing<u8> = GrowableRing::try_new(50, 20).unwrap();
        assert_eq!(ring.capacity(), 20);
    }
}
