//! Time-ordered event queue with deterministic tie-breaking.
//!
//! Events are popped by `(time, priority, insertion order)`. Lower priority
//! values run first, so damage scheduled for an instant always resolves
//! before any decision taken at that same instant.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::Time;

/// Same-tick ordering class of a queued event.
pub trait Prioritized {
    /// Lower runs first among events due at the same time.
    fn priority(&self) -> u8;
}

#[derive(Debug, Clone)]
struct Entry<E> {
    time: Time,
    priority: u8,
    seq: u64,
    event: E,
}

impl<E> Entry<E> {
    fn key(&self) -> (Time, u8, u64) {
        (self.time, self.priority, self.seq)
    }
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-queue of timed events.
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E: Prioritized> EventQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` at `time`.
    pub fn push(&mut self, time: Time, event: E) {
        let entry = Entry {
            time,
            priority: event.priority(),
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Schedules `event` `delay` ms after `now`. Times past the representable
    /// range clamp to `Time::MAX`, which lies at or beyond any time limit.
    pub fn push_after(&mut self, now: Time, delay: Time, event: E) {
        self.push(now.saturating_add(delay), event);
    }

    /// Removes the next event.
    pub fn pop(&mut self) -> Option<(Time, E)> {
        self.heap.pop().map(|Reverse(e)| (e.time, e.event))
    }

    /// Time and priority of the next event.
    #[must_use]
    pub fn peek(&self) -> Option<(Time, u8)> {
        self.heap.peek().map(|Reverse(e)| (e.time, e.priority))
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Probe {
        Hit(u8),
        Decide(u8),
    }

    impl Prioritized for Probe {
        fn priority(&self) -> u8 {
            match self {
                Self::Hit(_) => 0,
                Self::Decide(_) => 1,
            }
        }
    }

    #[test]
    fn earlier_time_first() {
        let mut q = EventQueue::new();
        q.push(200, Probe::Hit(0));
        q.push(100, Probe::Decide(0));
        assert_eq!(q.pop(), Some((100, Probe::Decide(0))));
        assert_eq!(q.pop(), Some((200, Probe::Hit(0))));
        assert!(q.is_empty());
    }

    #[test]
    fn damage_before_decision_on_ties() {
        let mut q = EventQueue::new();
        q.push(100, Probe::Decide(0));
        q.push(100, Probe::Hit(0));
        assert_eq!(q.peek(), Some((100, 0)));
        assert_eq!(q.pop(), Some((100, Probe::Hit(0))));
    }

    #[test]
    fn far_future_events_clamp_instead_of_wrapping() {
        let mut q = EventQueue::new();
        q.push_after(Time::MAX - 10, 1_500_000_000, Probe::Hit(0));
        q.push_after(100, 50, Probe::Decide(0));
        assert_eq!(q.pop(), Some((150, Probe::Decide(0))));
        assert_eq!(q.pop(), Some((Time::MAX, Probe::Hit(0))));
    }

    #[test]
    fn insertion_order_breaks_remaining_ties() {
        let mut q = EventQueue::new();
        q.push(100, Probe::Decide(2));
        q.push(100, Probe::Decide(1));
        assert_eq!(q.pop(), Some((100, Probe::Decide(2))));
        assert_eq!(q.pop(), Some((100, Probe::Decide(1))));
        assert_eq!(q.len(), 0);
    }
}
