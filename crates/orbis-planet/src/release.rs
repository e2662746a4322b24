//! Deferred release of replaced texture sets.
//!
//! A consumer may still be sampling the set it was handed a moment ago, so a
//! replaced set is parked here and handed back only after a grace period
//! measured in scheduler ticks.

use std::collections::VecDeque;

/// Items waiting to be released, in the order they were queued.
#[derive(Debug)]
pub struct ReleaseQueue<T> {
    grace_ticks: u32,
    tick: u64,
    pending: VecDeque<(u64, T)>,
}

impl<T> ReleaseQueue<T> {
    /// Queue whose items become due `grace_ticks` ticks after they are queued.
    pub fn new(grace_ticks: u32) -> Self {
        Self {
            grace_ticks,
            tick: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn grace_ticks(&self) -> u32 {
        self.grace_ticks
    }

    /// Ticks counted so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Park `item` until the grace period has passed.
    pub fn enqueue(&mut self, item: T) {
        let due = self.tick + u64::from(self.grace_ticks);
        self.pending.push_back((due, item));
    }

    /// Count one tick and return everything that became due.
    pub fn advance(&mut self) -> Vec<T> {
        self.tick += 1;
        self.drain_due()
    }

    /// Return everything already due without counting a tick.
    pub fn drain_due(&mut self) -> Vec<T> {
        let mut due = Vec::new();
        // Due ticks are non-decreasing because the grace period is fixed.
        while let Some((at, _)) = self.pending.front() {
            if *at > self.tick {
                break;
            }
            if let Some((_, item)) = self.pending.pop_front() {
                due.push(item);
            }
        }
        due
    }

    /// Return everything regardless of due tick, e.g. on teardown.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|(_, item)| item).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_after_grace_period() {
        let mut queue = ReleaseQueue::new(3);
        queue.enqueue("old");

        assert!(queue.advance().is_empty());
        assert!(queue.advance().is_empty());
        assert_eq!(queue.advance(), vec!["old"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_due_does_not_count_a_tick() {
        let mut queue = ReleaseQueue::new(1);
        queue.enqueue(1);
        assert!(queue.drain_due().is_empty());
        assert_eq!(queue.current_tick(), 0);
        assert_eq!(queue.advance(), vec![1]);
    }

    #[test]
    fn test_zero_grace_is_due_immediately() {
        let mut queue = ReleaseQueue::new(0);
        queue.enqueue('a');
        assert_eq!(queue.drain_due(), vec!['a']);
    }

    #[test]
    fn test_items_release_in_queue_order() {
        let mut queue = ReleaseQueue::new(2);
        queue.enqueue(1);
        queue.advance();
        queue.enqueue(2);
        queue.enqueue(3);

        assert_eq!(queue.advance(), vec![1]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.advance(), vec![2, 3]);
    }

    #[test]
    fn test_drain_all_ignores_due_ticks() {
        let mut queue = ReleaseQueue::new(100);
        queue.enqueue(1);
        queue.enqueue(2);
        assert_eq!(queue.drain_all(), vec![1, 2]);
        assert!(queue.is_empty());
    }
}
